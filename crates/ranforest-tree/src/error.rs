use std::path::PathBuf;

/// Errors from tree growth, evaluation and dump handling.
///
/// Degenerate nodes and an exhausted node capacity are not errors: growth
/// resolves both by making the node terminal.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when the feature matrix has zero samples.
    #[error("feature matrix has zero samples")]
    EmptyDataset,

    /// Returned when the feature matrix has zero feature columns.
    #[error("feature matrix has zero feature columns")]
    ZeroFeatures,

    /// Returned when a row has a different number of features than the first row.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the row.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a per-sample array does not match the number of samples.
    #[error("{what} has length {got}, expected {expected}")]
    LengthMismatch {
        /// Which input array is mismatched.
        what: &'static str,
        /// The expected length.
        expected: usize,
        /// The actual length.
        got: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a target value is NaN or infinite.
    #[error("non-finite target value at sample {sample_index}")]
    NonFiniteTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a bootstrap weight is negative or not finite.
    #[error("invalid weight {weight} at sample {sample_index}")]
    InvalidWeight {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The rejected weight.
        weight: f64,
    },

    /// Returned when a class id is not below the declared class count.
    #[error("sample {sample_index} has class {class}, but only {n_classes} classes are declared")]
    ClassOutOfRange {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The class id found.
        class: usize,
        /// The declared number of classes.
        n_classes: usize,
    },

    /// Returned when the declared class count is zero.
    #[error("number of classes must be at least 1")]
    ZeroClasses,

    /// Returned when every bootstrap weight is zero.
    #[error("no sample has a positive weight")]
    EmptyBag,

    /// Returned when the sort index was built for a differently shaped matrix.
    #[error(
        "sort index covers {index_samples} samples x {index_features} features, \
         matrix is {matrix_samples} x {matrix_features}"
    )]
    SortIndexMismatch {
        /// Samples covered by the sort index.
        index_samples: usize,
        /// Features covered by the sort index.
        index_features: usize,
        /// Samples in the feature matrix.
        matrix_samples: usize,
        /// Features in the feature matrix.
        matrix_features: usize,
    },

    /// Returned when a prediction input is too short for the tree.
    #[error("prediction input has {got} features, tree requires at least {expected}")]
    PredictionFeatureMismatch {
        /// The number of features the tree reads.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a tree dump cannot be parsed.
    #[error("malformed tree dump at line {line}: {reason}")]
    ParseDump {
        /// One-based line number.
        line: usize,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when writing a tree dump fails.
    #[error("failed to write tree dump to {path}")]
    WriteDump {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading a tree dump fails.
    #[error("failed to read tree dump from {path}")]
    ReadDump {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
