//! Domain types for ranforest-io.

use ranforest_tree::{FeatureMatrix, TreeError};

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A numeric table split into features, an optional target and optional weights.
///
/// Produced by [`TableReader`](crate::TableReader). Rows are in file order;
/// `features[i]`, `target[i]` and `weights[i]` describe the same sample.
#[derive(Debug, Clone)]
pub struct TrainingTable {
    feature_names: Vec<String>,
    features: Vec<Vec<f64>>,
    target_name: Option<String>,
    target: Option<Vec<f64>>,
    weights: Option<Vec<f64>>,
}

impl TrainingTable {
    pub(crate) fn new(
        feature_names: Vec<String>,
        features: Vec<Vec<f64>>,
        target_name: Option<String>,
        target: Option<Vec<f64>>,
        weights: Option<Vec<f64>>,
    ) -> Self {
        Self {
            feature_names,
            features,
            target_name,
            target,
            weights,
        }
    }

    /// Return the feature column names in file order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the feature rows (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the target column name, if one was read.
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// Return the target values, if a target column was read.
    #[must_use]
    pub fn target(&self) -> Option<&[f64]> {
        self.target.as_deref()
    }

    /// Return the weight column, if one was read.
    #[must_use]
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Return the weight column, or unit weights when none was read.
    #[must_use]
    pub fn weights_or_unit(&self) -> Vec<f64> {
        self.weights
            .clone()
            .unwrap_or_else(|| vec![1.0; self.n_samples()])
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Build the column-major matrix consumed by tree growth.
    ///
    /// # Errors
    ///
    /// Propagates [`TreeError`] from [`FeatureMatrix::from_rows`]; a table
    /// that passed the reader's validation does not trigger any.
    pub fn to_matrix(&self) -> Result<FeatureMatrix, TreeError> {
        FeatureMatrix::from_rows(&self.features)
    }

    /// Interpret the target column as class ids.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::NoTargetColumn`] | the table was read without a target |
    /// | [`IoError::InvalidClassLabel`] | a value is negative or fractional |
    pub fn class_labels(&self) -> Result<Vec<usize>, IoError> {
        let target = self.target.as_deref().ok_or(IoError::NoTargetColumn)?;
        target
            .iter()
            .enumerate()
            .map(|(row_index, &value)| {
                if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
                    return Err(IoError::InvalidClassLabel { row_index, value });
                }
                Ok(value as usize)
            })
            .collect()
    }
}
