use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use cvd_risk_core::{FeatureMap, FeatureValue, PatientVitals, RiskScorer, ScoreOptions};

const BUNDLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models/cvd_gbdt_v1.json");
const PATIENT_COUNT: usize = 256;

fn generate_patients(count: usize) -> Vec<FeatureMap> {
    (0..count)
        .map(|idx| {
            let i = idx as i64;
            PatientVitals {
                patient_id: None,
                gender: 1 + i % 2,
                age_years: FeatureValue::Int(30 + i % 35),
                height: 150.0 + (i % 40) as f64,
                weight: 50.0 + (i * 7 % 60) as f64,
                ap_hi: FeatureValue::Int(100 + i * 13 % 80),
                ap_lo: FeatureValue::Int(60 + i * 11 % 40),
                cholesterol: 1 + i % 3,
                gluc: 1 + i * 5 % 3,
                smoke: i % 7 / 6,
                alco: i % 11 / 10,
                active: 1 - i % 4 / 3,
            }
            .to_feature_map()
        })
        .collect()
}

fn benchmark_scoring(c: &mut Criterion) {
    let scorer = RiskScorer::from_bundle_path(BUNDLE);
    let patients = generate_patients(PATIENT_COUNT);
    let options = ScoreOptions::default();

    let mut group = c.benchmark_group("risk_scoring");
    group.throughput(Throughput::Elements(PATIENT_COUNT as u64));
    group.bench_function("score_256_patients", |b| {
        b.iter(|| {
            for features in &patients {
                let result = scorer.score(features, &options);
                criterion::black_box(result.ok());
            }
        });
    });

    let ctx = scorer.context().cloned();
    if let Some(ctx) = ctx {
        let vector = vec![2.0, 55.0, 170.0, 89.5, 31.0, 165.0, 95.0, 70.0, 118.3, 3.0, 1.0, 1.0, 0.0, 1.0];
        group.bench_function("tree_shap_single", |b| {
            b.iter(|| criterion::black_box(ctx.explainer().attribute(&vector).ok()));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_scoring);
criterion_main!(benches);
