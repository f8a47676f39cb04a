//! Growth result types.

use crate::criterion::Criterion;
use crate::tree::RanTree;

/// Why growth stopped at a terminal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// Population was at or below the minimum node size.
    MinNodeSize,
    /// All weight belonged to one class.
    Pure,
    /// No drawn feature produced a legal, finite, non-negative decrease.
    NoValidSplit,
    /// The node array had no room left for two children.
    CapacityExhausted,
}

/// Statistics of one node, indexed like the tree's nodes.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NodeStats {
    /// Number of distinct in-bag samples in the node.
    pub n_samples: usize,
    /// `Σ w` over the node.
    pub weight: f64,
    /// `Σ w·y` over the node.
    pub weighted_sum: f64,
    /// `Σ w·y²` over the node.
    pub weighted_sum_sq: f64,
    /// `Σ w` per class.
    pub class_weights: Vec<f64>,
    /// Recorded decrease for split nodes.
    pub impurity_decrease: Option<f64>,
    /// Stop reason for terminal nodes.
    pub terminal_reason: Option<TerminalReason>,
}

impl NodeStats {
    /// Weighted Gini numerator over denominator, `Σ_c w_c² / Σ_c w_c`.
    ///
    /// Larger is purer.
    #[must_use]
    pub fn gini_score(&self) -> f64 {
        let num: f64 = self.class_weights.iter().map(|w| w * w).sum();
        num / self.weight
    }

    /// Centred weighted sum of squares, `Σ w·y² - (Σ w·y)² / Σ w`.
    #[must_use]
    pub fn sum_of_squares(&self) -> f64 {
        self.weighted_sum_sq - self.weighted_sum * self.weighted_sum / self.weight
    }
}

/// Diagnostics collected while growing one tree.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GrowthSummary {
    /// Criterion used.
    pub criterion: Criterion,
    /// Number of samples in the feature matrix.
    pub n_samples: usize,
    /// Number of samples with positive weight.
    pub n_inbag: usize,
    /// Node-array capacity the tree was grown against.
    pub capacity: usize,
    /// Whether any node was forced terminal for lack of capacity.
    pub capacity_exhausted: bool,
    /// Number of nodes forced terminal for lack of capacity.
    pub n_forced_terminal: usize,
    /// Summed impurity decrease per feature over all splits.
    pub feature_importances: Vec<f64>,
    /// Per-node statistics.
    pub node_stats: Vec<NodeStats>,
}

impl GrowthSummary {
    /// Feature importances scaled to sum to 1.0 (all zeros for a single leaf).
    #[must_use]
    pub fn normalized_importances(&self) -> Vec<f64> {
        let mut totals = self.feature_importances.clone();
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }
}

/// Result of growing one tree.
#[derive(Debug, Clone)]
pub struct GrowResult {
    tree: RanTree,
    summary: GrowthSummary,
}

impl GrowResult {
    pub(crate) fn new(tree: RanTree, summary: GrowthSummary) -> Self {
        Self { tree, summary }
    }

    /// Borrow the finished tree.
    #[must_use]
    pub fn tree(&self) -> &RanTree {
        &self.tree
    }

    /// Borrow the growth diagnostics.
    #[must_use]
    pub fn summary(&self) -> &GrowthSummary {
        &self.summary
    }

    /// Consume the result and return the finished tree.
    #[must_use]
    pub fn into_tree(self) -> RanTree {
        self.tree
    }

    /// Consume the result and return both parts.
    #[must_use]
    pub fn into_parts(self) -> (RanTree, GrowthSummary) {
        (self.tree, self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn node_stat_impurities() {
        let stats = NodeStats {
            n_samples: 4,
            weight: 4.0,
            weighted_sum: 6.0,
            weighted_sum_sq: 14.0,
            class_weights: vec![1.0, 3.0],
            impurity_decrease: None,
            terminal_reason: Some(TerminalReason::MinNodeSize),
        };
        assert!((stats.gini_score() - 2.5).abs() < 1e-12);
        assert!((stats.sum_of_squares() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn into_parts_keeps_tree_and_summary() {
        let tree = RanTree::from_nodes(vec![Node::Terminal { class: 0, value: 0.5 }], 1);
        let summary = GrowthSummary {
            criterion: Criterion::Variance,
            n_samples: 2,
            n_inbag: 2,
            capacity: 5,
            capacity_exhausted: false,
            n_forced_terminal: 0,
            feature_importances: vec![0.0],
            node_stats: vec![],
        };
        let (tree_out, summary_out) = GrowResult::new(tree.clone(), summary).into_parts();
        assert_eq!(tree_out, tree);
        assert_eq!(summary_out.capacity, 5);
        assert_eq!(summary_out.criterion, Criterion::Variance);
    }

    #[test]
    fn normalized_importances_sum_to_one() {
        let summary = GrowthSummary {
            criterion: Criterion::Gini,
            n_samples: 4,
            n_inbag: 4,
            capacity: 9,
            capacity_exhausted: false,
            n_forced_terminal: 0,
            feature_importances: vec![1.0, 3.0],
            node_stats: vec![],
        };
        assert_eq!(summary.normalized_importances(), vec![0.25, 0.75]);
    }
}
