//! Decision tree structures for ensemble inference
//!
//! Nodes are stored in a flat vector with node 0 as the root. Every internal
//! node carries the training cover that reached it so the attribution engine
//! can weigh unseen branches.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` contains the output value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (for reference, not used in traversal)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    #[serde(rename = "feature_idx", alias = "feature")]
    pub feature_idx: i32,

    /// Split threshold; samples with `x <= threshold` go left
    pub threshold: f64,

    /// Training sample weight that reached this node
    pub cover: f64,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<f64>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32, cover: f64) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            cover,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, value: f64, cover: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            cover,
            leaf: Some(value),
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }

    /// Get the leaf value if this is a leaf node
    pub fn leaf_value(&self) -> Option<f64> {
        self.leaf
    }

    /// Child indices as `(left, right)`; only meaningful for internal nodes
    pub(crate) fn children(&self) -> (usize, usize) {
        (self.left as usize, self.right as usize)
    }
}

fn default_tree_weight() -> f64 {
    1.0
}

/// Relative slack allowed between a node's cover and its children's total
const COVER_TOLERANCE: f64 = 1e-3;

/// A single decision tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Multiplier applied to this tree's output when aggregating the ensemble
    #[serde(default = "default_tree_weight")]
    pub weight: f64,
}

impl Tree {
    /// Create a new tree with the given nodes and weight
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Evaluate this tree on a feature vector, unweighted
    ///
    /// Goes left when `feature <= threshold`. Malformed structures evaluate
    /// to 0.0; `validate` rejects them at load time.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf_value().unwrap_or(0.0);
            }

            let Some(&value) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };

            let (left, right) = node.children();
            idx = if value <= node.threshold { left } else { right };
        }
    }

    /// Cover-weighted mean leaf value: the tree's output when no feature is known
    pub fn expected_value(&self) -> f64 {
        self.expected_from(0)
    }

    fn expected_from(&self, idx: usize) -> f64 {
        let Some(node) = self.nodes.get(idx) else {
            return 0.0;
        };
        if node.is_leaf() {
            return node.leaf_value().unwrap_or(0.0);
        }
        let (left, right) = node.children();
        let left_cover = self.nodes.get(left).map_or(0.0, |n| n.cover);
        let right_cover = self.nodes.get(right).map_or(0.0, |n| n.cover);
        (left_cover * self.expected_from(left) + right_cover * self.expected_from(right))
            / node.cover
    }

    /// Validate tree structure against a feature vector width
    ///
    /// Children must sit after their parent, which rules out cycles, and
    /// their covers must add up to the parent's.
    pub fn validate(&self, num_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        if !self.weight.is_finite() {
            return Err(format!("Tree weight is not finite: {}", self.weight));
        }

        let len = self.nodes.len() as i32;

        for (i, node) in self.nodes.iter().enumerate() {
            if !node.cover.is_finite() || node.cover <= 0.0 {
                return Err(format!("Node {} has invalid cover: {}", i, node.cover));
            }

            if node.is_leaf() {
                match node.leaf {
                    Some(value) if value.is_finite() => {}
                    Some(value) => return Err(format!("Leaf node {i} has non-finite value: {value}")),
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
                continue;
            }

            let own = i as i32;
            if node.left <= own || node.left >= len {
                return Err(format!("Node {} has invalid left child: {}", i, node.left));
            }
            if node.right <= own || node.right >= len {
                return Err(format!("Node {} has invalid right child: {}", i, node.right));
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= num_features {
                return Err(format!(
                    "Internal node {} has invalid feature index: {}",
                    i, node.feature_idx
                ));
            }

            if !node.threshold.is_finite() {
                return Err(format!("Node {} has non-finite threshold", i));
            }

            let (left, right) = node.children();
            let children = self.nodes[left].cover + self.nodes[right].cover;
            if (children - node.cover).abs() > COVER_TOLERANCE * node.cover {
                return Err(format!(
                    "Node {} cover {} does not match its children's total {}",
                    i, node.cover, children
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(
            vec![
                Node::internal(0, 0, 50.0, 1, 2, 10.0),
                Node::leaf(1, -1.0, 4.0),
                Node::leaf(2, 2.0, 6.0),
            ],
            1.0,
        )
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 3, 12.5, 1, 2, 100.0);
        assert_eq!(internal.feature_idx, 3);
        assert_eq!(internal.threshold, 12.5);
        assert!(!internal.is_leaf());

        let leaf = Node::leaf(1, -0.25, 40.0);
        assert_eq!(leaf.feature_idx, -1);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf_value(), Some(-0.25));
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[30.0]), -1.0);
        assert_eq!(tree.evaluate(&[50.0]), -1.0); // Equal goes left
        assert_eq!(tree.evaluate(&[60.0]), 2.0);
    }

    #[test]
    fn test_expected_value_weighs_by_cover() {
        let tree = stump();
        assert!((tree.expected_value() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate(1).is_ok());

        // Split feature outside the vector
        assert!(stump().validate(0).is_err());

        // Left child out of bounds
        let mut invalid = stump();
        invalid.nodes[0].left = 5;
        assert!(invalid.validate(1).is_err());

        // Child pointing back at its parent
        let mut cyclic = stump();
        cyclic.nodes[0].right = 0;
        assert!(cyclic.validate(1).is_err());

        let mut no_cover = stump();
        no_cover.nodes[2].cover = 0.0;
        assert!(no_cover.validate(1).is_err());
    }

    #[test]
    fn test_cover_must_match_children() {
        let mut inflated = stump();
        inflated.nodes[0].cover = 25.0;
        let err = inflated.validate(1).unwrap_err();
        assert!(err.contains("Node 0 cover"));

        // Float drift from exported hessian sums is tolerated
        let mut drifted = stump();
        drifted.nodes[0].cover = 10.000_001;
        assert!(drifted.validate(1).is_ok());
    }
}
