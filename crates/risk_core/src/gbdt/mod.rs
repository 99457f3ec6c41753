//! Tree ensemble inference
//!
//! The persisted classifier is a weighted ensemble of binary decision trees.
//! Each node records the training cover that reached it, which the attribution
//! engine needs to integrate over unknown features.
//!
//! # Model Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "objective": "binary_logistic",
//!   "base_score": 0.0,
//!   "feature_importances": [0.6, 0.4],
//!   "trees": [
//!     {
//!       "weight": 1.0,
//!       "nodes": [
//!         {"id":0,"left":1,"right":2,"feature_idx":1,"threshold":129.5,"cover":700.0,"leaf":null},
//!         {"id":1,"left":-1,"right":-1,"feature_idx":-1,"threshold":0.0,"cover":400.0,"leaf":-0.9},
//!         {"id":2,"left":-1,"right":-1,"feature_idx":-1,"threshold":0.0,"cover":300.0,"leaf":0.95}
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! # Usage
//!
//! ```rust
//! use cvd_risk_core::gbdt::{Node, Objective, Tree, TreeEnsemble};
//!
//! let tree = Tree::new(
//!     vec![
//!         Node::internal(0, 0, 129.5, 1, 2, 700.0),
//!         Node::leaf(1, -0.9, 400.0),
//!         Node::leaf(2, 0.95, 300.0),
//!     ],
//!     1.0,
//! );
//! let model = TreeEnsemble::new(Objective::BinaryLogistic, 0.0, vec![tree], vec![1.0]);
//!
//! let p = model.probability(&[165.0]);
//! assert!(p > 0.5);
//! ```

pub mod model;
pub mod tree;

pub use model::{Objective, TreeEnsemble, FORMAT_VERSION};
pub use tree::{Node, Tree};
