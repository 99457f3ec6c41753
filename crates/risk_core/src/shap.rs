//! Per-instance feature attribution for tree ensembles
//!
//! Exact path-dependent TreeSHAP (Lundberg et al., "Consistent Individualized
//! Feature Attribution for Tree Ensembles"). For every tree the algorithm
//! walks each root-to-leaf path once, tracking for the features split on so
//! far the fraction of training cover that flows down the path with and
//! without the feature known. Unknown features are integrated out using node
//! covers, so the explainer needs no background dataset.
//!
//! Contributions are in the model's raw output space (log-odds for boosted
//! models) and satisfy local accuracy: `expected_value + sum(phi) == margin`.

use crate::errors::ScoringError;
use crate::gbdt::{Objective, Tree, TreeEnsemble};
use crate::model::ModelAdapter;
use std::sync::Arc;

/// Index of the positive class in per-class outputs
pub const POSITIVE_CLASS: usize = 1;

/// Contributions in the shape the explainer natively produces
#[derive(Debug, Clone, PartialEq)]
pub enum ShapOutput {
    /// One set for a single-output (margin) model
    Margin(Vec<f64>),
    /// One set per class, indexed by class label
    PerClass(Vec<Vec<f64>>),
}

impl ShapOutput {
    /// The contribution set explaining the positive class
    pub fn positive_class(self) -> Result<Vec<f64>, ScoringError> {
        match self {
            ShapOutput::Margin(values) => Ok(values),
            ShapOutput::PerClass(mut classes) => {
                if classes.len() <= POSITIVE_CLASS {
                    return Err(ScoringError::UnexpectedFailure(format!(
                        "attribution returned {} class(es), expected a positive class",
                        classes.len()
                    )));
                }
                Ok(classes.swap_remove(POSITIVE_CLASS))
            }
        }
    }
}

/// TreeSHAP explainer bound to the adapter's ensemble
#[derive(Debug)]
pub struct TreeExplainer {
    model: Arc<TreeEnsemble>,
    num_features: usize,
    expected_value: f64,
}

impl TreeExplainer {
    /// Bind to the exact ensemble instance `adapter` predicts with
    pub fn new(adapter: &ModelAdapter) -> Self {
        let model = Arc::clone(adapter.ensemble());
        let expected_value = model.expected_margin();
        Self {
            model,
            num_features: adapter.num_features(),
            expected_value,
        }
    }

    /// Model output when no feature is known
    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }

    pub(crate) fn is_bound_to(&self, adapter: &ModelAdapter) -> bool {
        Arc::ptr_eq(&self.model, adapter.ensemble())
    }

    /// Raw attribution, shaped by the model objective
    pub fn shap_values(&self, x: &[f64]) -> ShapOutput {
        let mut phi = vec![0.0; self.num_features];
        for tree in &self.model.trees {
            tree_shap(tree, x, &mut phi);
        }

        match self.model.objective {
            Objective::BinaryLogistic => ShapOutput::Margin(phi),
            // Class 0 leaves are the complement of class 1 leaves, which
            // negates every contribution.
            Objective::ClassProbability => {
                let negative = phi.iter().map(|v| -v).collect();
                ShapOutput::PerClass(vec![negative, phi])
            }
        }
    }

    /// Positive-class contributions aligned with the feature contract
    pub fn attribute(&self, x: &[f64]) -> Result<Vec<f64>, ScoringError> {
        if x.len() != self.num_features {
            return Err(ScoringError::UnexpectedFailure(format!(
                "feature vector has {} values, explainer expects {}",
                x.len(),
                self.num_features
            )));
        }

        let phi = self.shap_values(x).positive_class()?;
        if phi.len() != self.num_features || phi.iter().any(|v| !v.is_finite()) {
            return Err(ScoringError::UnexpectedFailure(
                "attribution produced an invalid contribution vector".to_string(),
            ));
        }
        Ok(phi)
    }
}

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

fn tree_shap(tree: &Tree, x: &[f64], phi: &mut [f64]) {
    if tree.nodes.is_empty() {
        return;
    }
    recurse(tree, x, phi, 0, Vec::new(), 1.0, 1.0, None);
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    x: &[f64],
    phi: &mut [f64],
    node_idx: usize,
    mut path: Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    extend(&mut path, zero_fraction, one_fraction, feature);
    let Some(node) = tree.nodes.get(node_idx) else {
        return;
    };

    if node.is_leaf() {
        let value = node.leaf_value().unwrap_or(0.0) * tree.weight;
        for i in 1..path.len() {
            let w = unwound_sum(&path, i);
            let el = path[i];
            if let Some(f) = el.feature {
                phi[f] += w * (el.one_fraction - el.zero_fraction) * value;
            }
        }
        return;
    }

    let split = node.feature_idx as usize;
    let (left, right) = node.children();
    let goes_left = x.get(split).is_some_and(|v| *v <= node.threshold);
    let (hot, cold) = if goes_left { (left, right) } else { (right, left) };

    let cover_of = |idx: usize| tree.nodes.get(idx).map_or(0.0, |n| n.cover);
    let hot_zero = cover_of(hot) / node.cover;
    let cold_zero = cover_of(cold) / node.cover;

    // A feature split on again higher up is unwound and re-entered here
    let mut incoming_zero = 1.0;
    let mut incoming_one = 1.0;
    if let Some(k) = path.iter().position(|el| el.feature == Some(split)) {
        incoming_zero = path[k].zero_fraction;
        incoming_one = path[k].one_fraction;
        unwind(&mut path, k);
    }

    recurse(
        tree,
        x,
        phi,
        hot,
        path.clone(),
        hot_zero * incoming_zero,
        incoming_one,
        Some(split),
    );
    recurse(
        tree,
        x,
        phi,
        cold,
        path,
        cold_zero * incoming_zero,
        0.0,
        Some(split),
    );
}

fn extend(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

fn unwind(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one);
            next_one_portion = tmp - path[i].weight * zero * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with element `index` removed
fn unwound_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = next_one_portion * denom / ((i + 1) as f64 * one);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero * (depth - i) as f64 / denom;
        } else {
            total += path[i].weight / zero / ((depth - i) as f64 / denom);
        }
    }
    total
}
