use std::collections::VecDeque;

use crate::node::{Node, NodeStatus};

/// A finished, immutable decision tree.
///
/// Nodes live in a flat array with the root at index 0; every split node's
/// children have larger indices than the node itself, so the structure can
/// not contain cycles and evaluation visits at most `n_nodes` nodes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RanTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_classes: usize,
}

impl RanTree {
    pub(crate) fn from_nodes(nodes: Vec<Node>, n_classes: usize) -> Self {
        debug_assert!(!nodes.is_empty(), "a tree has at least a root");
        Self { nodes, n_classes }
    }

    /// Return the total number of nodes (splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of terminal nodes.
    #[must_use]
    pub fn n_terminal(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_terminal()).count()
    }

    /// Return the number of classes the tree was grown with.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return all nodes in index order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the node at `index`, if any.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Return the status of the node at `index`, if any.
    #[must_use]
    pub fn node_status(&self, index: usize) -> Option<NodeStatus> {
        self.nodes.get(index).map(Node::status)
    }

    /// Return the majority class of the node at `index`, if any.
    #[must_use]
    pub fn node_class(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).map(Node::class)
    }

    /// Compact variable code of a node: the split feature for split nodes,
    /// `class - n_classes` (always negative) for terminal nodes.
    #[must_use]
    pub fn encoded_variable(&self, index: usize) -> Option<i64> {
        self.nodes.get(index).map(|node| self.encode(node))
    }

    pub(crate) fn encode(&self, node: &Node) -> i64 {
        match node {
            Node::Split { feature, .. } => feature.index() as i64,
            Node::Terminal { class, .. } => *class as i64 - self.n_classes as i64,
        }
    }

    /// Minimum length of a sample passed to evaluation: one past the highest
    /// feature index used by any split, `0` for a single-leaf tree.
    #[must_use]
    pub fn required_features(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Split { feature, .. } => Some(feature.index() + 1),
                Node::Terminal { .. } => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Return the maximum depth of the tree; a single leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut queue = VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((index, d)) = queue.pop_front() {
            match &self.nodes[index] {
                Node::Terminal { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FeatureIndex, NodeIndex};

    fn small_tree() -> RanTree {
        RanTree::from_nodes(
            vec![
                Node::Split {
                    feature: FeatureIndex::new(1),
                    threshold: 0.5,
                    left: NodeIndex::new(1),
                    right: NodeIndex::new(2),
                    class: 0,
                },
                Node::Terminal { class: 0, value: 0.0 },
                Node::Split {
                    feature: FeatureIndex::new(0),
                    threshold: 2.0,
                    left: NodeIndex::new(3),
                    right: NodeIndex::new(4),
                    class: 1,
                },
                Node::Terminal { class: 1, value: 1.0 },
                Node::Terminal { class: 0, value: 0.25 },
            ],
            2,
        )
    }

    #[test]
    fn counts_and_depth() {
        let tree = small_tree();
        assert_eq!(tree.n_nodes(), 5);
        assert_eq!(tree.n_terminal(), 3);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.required_features(), 2);
    }

    #[test]
    fn encoded_variable_marks_terminals_negative() {
        let tree = small_tree();
        assert_eq!(tree.encoded_variable(0), Some(1));
        assert_eq!(tree.encoded_variable(1), Some(-2));
        assert_eq!(tree.encoded_variable(3), Some(-1));
        assert_eq!(tree.encoded_variable(9), None);
    }

    #[test]
    fn single_leaf_tree() {
        let tree = RanTree::from_nodes(vec![Node::Terminal { class: 0, value: 3.0 }], 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.required_features(), 0);
        assert_eq!(tree.node_status(0), Some(NodeStatus::Terminal));
    }
}
