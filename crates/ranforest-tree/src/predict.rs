//! Evaluation of a finished tree on unseen feature vectors.

use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::error::TreeError;
use crate::matrix::FeatureMatrix;
use crate::node::Node;
use crate::tree::RanTree;

impl RanTree {
    /// Predict the leaf value for a single sample.
    ///
    /// Starting at the root, goes left when `sample[feature] <= threshold`
    /// and right otherwise, stopping at the first terminal node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when the sample is
    /// shorter than [`RanTree::required_features`].
    pub fn predict(&self, sample: &[f64]) -> Result<f64, TreeError> {
        self.check_len(sample.len())?;
        Ok(leaf_value(self.leaf(|f| sample[f])))
    }

    /// Predict the terminal class for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when the sample is
    /// shorter than [`RanTree::required_features`].
    pub fn predict_class(&self, sample: &[f64]) -> Result<usize, TreeError> {
        self.check_len(sample.len())?;
        Ok(self.leaf(|f| sample[f]).class())
    }

    /// Predict the leaf value and terminal class for a single sample with
    /// one walk.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when the sample is
    /// shorter than [`RanTree::required_features`].
    pub fn predict_with_class(&self, sample: &[f64]) -> Result<(f64, usize), TreeError> {
        self.check_len(sample.len())?;
        let node = self.leaf(|f| sample[f]);
        Ok((leaf_value(node), node.class()))
    }

    /// Predict the leaf value for row `row` of `matrix` without copying it.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when the matrix has
    /// too few feature columns.
    ///
    /// # Panics
    ///
    /// Panics if `row >= matrix.n_samples()`.
    pub fn predict_row(&self, matrix: &FeatureMatrix, row: usize) -> Result<f64, TreeError> {
        self.check_len(matrix.n_features())?;
        Ok(leaf_value(self.leaf(|f| matrix.value(row, f))))
    }

    /// Predict leaf values for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] if any sample is too short.
    pub fn predict_batch(&self, samples: &[Vec<f64>]) -> Result<Vec<f64>, TreeError> {
        samples
            .par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Predict `(value, class)` pairs for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] if any sample is too short.
    pub fn predict_batch_with_class(
        &self,
        samples: &[Vec<f64>],
    ) -> Result<Vec<(f64, usize)>, TreeError> {
        samples
            .par_iter()
            .map(|sample| self.predict_with_class(sample))
            .collect()
    }

    /// Predict leaf values for every row of `matrix` in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when the matrix has
    /// too few feature columns.
    pub fn predict_matrix(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, TreeError> {
        self.check_len(matrix.n_features())?;
        Ok((0..matrix.n_samples())
            .into_par_iter()
            .map(|row| leaf_value(self.leaf(|f| matrix.value(row, f))))
            .collect())
    }

    fn check_len(&self, got: usize) -> Result<(), TreeError> {
        let expected = self.required_features();
        if got < expected {
            return Err(TreeError::PredictionFeatureMismatch { expected, got });
        }
        Ok(())
    }

    /// Walk from the root to a terminal node in at most `n_nodes` steps.
    fn leaf(&self, value_of: impl Fn(usize) -> f64) -> &Node {
        let mut index = 0usize;
        for _ in 0..self.nodes.len() {
            match &self.nodes[index] {
                Node::Terminal { .. } => break,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    index = if value_of(feature.index()) <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
        &self.nodes[index]
    }
}

fn leaf_value(node: &Node) -> f64 {
    match node {
        Node::Terminal { value, .. } => *value,
        Node::Split { .. } => unreachable!("children always have larger indices, so the walk ends at a leaf"),
    }
}
