use cvd_risk_core::config::CONFIG_ENV;
use cvd_risk_core::ScoringConfig;
use std::io::Write;
use std::path::PathBuf;

struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl EnvVarGuard {
    fn new(key: &'static str, value: &str) -> Self {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self { key, previous }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(prev) = &self.previous {
            std::env::set_var(self.key, prev);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

// Single test so the process environment is never mutated concurrently
#[test]
fn environment_overrides_file_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "model_path = \"bundle.json\"\nthreshold = 0.4\ntop_n = 3\nlog_level = \"warn\""
    )
    .unwrap();
    let path = file.path().to_string_lossy().into_owned();

    {
        let _config = EnvVarGuard::new(CONFIG_ENV, &path);
        let config = ScoringConfig::load(None).unwrap();
        assert_eq!(config.model_path, PathBuf::from("bundle.json"));
        assert_eq!(config.threshold, 0.4);
        assert_eq!(config.top_n, 3);

        let _model = EnvVarGuard::new("MODEL_PATH", "/srv/models/cvd.json");
        let _threshold = EnvVarGuard::new("CVD_RISK_THRESHOLD", "0.3");
        let _top_n = EnvVarGuard::new("CVD_RISK_TOP_N", "not-a-number");
        let _log = EnvVarGuard::new("CVD_RISK_LOG", "debug");

        let config = ScoringConfig::load(None).unwrap();
        assert_eq!(config.model_path, PathBuf::from("/srv/models/cvd.json"));
        assert_eq!(config.threshold, 0.3);
        assert_eq!(config.top_n, 3);
        assert_eq!(config.log_level, "debug");

        let _bad = EnvVarGuard::new("CVD_RISK_THRESHOLD", "1.2");
        assert!(ScoringConfig::load(None).is_err());
    }

    // Explicit path wins over the environment
    let _config = EnvVarGuard::new(CONFIG_ENV, "/nonexistent/cvd_risk.toml");
    let config = ScoringConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.top_n, 3);
}
