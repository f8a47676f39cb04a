use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based column position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into the node array of a tree.
///
/// Children always carry a larger index than their parent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Create a new node index from a zero-based array position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based array index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final status of a node in a finished tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NodeStatus {
    /// Interior node with two children.
    Split,
    /// Leaf carrying a prediction.
    Terminal,
}

impl NodeStatus {
    /// Status code used in the text dump: `1` for split, `-1` for terminal.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            NodeStatus::Split => 1,
            NodeStatus::Terminal => -1,
        }
    }

    /// Parse a dump status code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(NodeStatus::Split),
            -1 => Some(NodeStatus::Terminal),
            _ => None,
        }
    }
}

/// A node of a finished tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior split node.
    Split {
        /// Feature used for the split.
        feature: FeatureIndex,
        /// Samples with `feature <= threshold` go left.
        threshold: f64,
        /// Index of the left child node.
        left: NodeIndex,
        /// Index of the right child node.
        right: NodeIndex,
        /// Class with the largest weighted population at this node.
        class: usize,
    },
    /// A leaf.
    Terminal {
        /// Class with the largest weighted population in the leaf.
        class: usize,
        /// Weighted mean of the target values in the leaf.
        value: f64,
    },
}

impl Node {
    /// Return the node status.
    #[must_use]
    pub fn status(&self) -> NodeStatus {
        match self {
            Node::Split { .. } => NodeStatus::Split,
            Node::Terminal { .. } => NodeStatus::Terminal,
        }
    }

    /// Return the majority class recorded for this node.
    #[must_use]
    pub fn class(&self) -> usize {
        match self {
            Node::Split { class, .. } | Node::Terminal { class, .. } => *class,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Terminal { .. })
    }
}
