//! Single decision-tree induction and evaluation for random forests.
//!
//! Grows one tree from a presorted feature matrix, per-sample bootstrap
//! weights and targets, drawing a random subset of features at every node.
//! Supports a weighted Gini criterion for classification and a weighted
//! variance criterion for regression, fast evaluation of the finished tree,
//! and a text dump that round-trips exactly.
//!
//! Bootstrap generation and forest aggregation belong to the caller: grow
//! any number of trees against one shared [`SortIndex`], each with its own
//! weights and RNG.

mod builder;
mod criterion;
mod dump;
mod error;
mod matrix;
mod node;
mod partition;
mod predict;
mod result;
mod sort_index;
mod targets;
mod tree;

pub use builder::{GrowInputs, TreeConfig};
pub use criterion::{BestSplit, Criterion};
pub use error::TreeError;
pub use matrix::FeatureMatrix;
pub use node::{FeatureIndex, Node, NodeIndex, NodeStatus};
pub use result::{GrowResult, GrowthSummary, NodeStats, TerminalReason};
pub use sort_index::SortIndex;
pub use targets::Targets;
pub use tree::RanTree;
