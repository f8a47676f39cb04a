//! Dense, read-only feature matrix.

use crate::error::TreeError;

/// `N` samples by `M` features, stored column-major.
///
/// Growth scans one feature column at a time, so each column is a
/// contiguous slice: `values[feature * n_samples + sample]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Vec<f64>,
    n_samples: usize,
    n_features: usize,
}

impl FeatureMatrix {
    /// Build a matrix from row-major input, `rows[sample][feature]`.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                               |
    /// |--------------------------------------|------------------------------------|
    /// | [`TreeError::EmptyDataset`]          | `rows` is empty                    |
    /// | [`TreeError::ZeroFeatures`]          | rows have zero columns             |
    /// | [`TreeError::FeatureCountMismatch`]  | rows have inconsistent lengths     |
    /// | [`TreeError::NonFiniteValue`]        | any value is NaN or infinite       |
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, TreeError> {
        let Some(first) = rows.first() else {
            return Err(TreeError::EmptyDataset);
        };
        let n_samples = rows.len();
        let n_features = first.len();
        if n_features == 0 {
            return Err(TreeError::ZeroFeatures);
        }

        let mut values = vec![0.0; n_samples * n_features];
        for (sample_index, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(TreeError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            for (feature_index, &val) in row.iter().enumerate() {
                if !val.is_finite() {
                    return Err(TreeError::NonFiniteValue {
                        sample_index,
                        feature_index,
                    });
                }
                values[feature_index * n_samples + sample_index] = val;
            }
        }

        Ok(Self {
            values,
            n_samples,
            n_features,
        })
    }

    /// Build a matrix from column-major input, `columns[feature][sample]`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FeatureMatrix::from_rows`]; a short or long column
    /// reports the first sample index past the shorter length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self, TreeError> {
        let Some(first) = columns.first() else {
            return Err(TreeError::ZeroFeatures);
        };
        let n_samples = first.len();
        if n_samples == 0 {
            return Err(TreeError::EmptyDataset);
        }
        let n_features = columns.len();

        let mut values = Vec::with_capacity(n_samples * n_features);
        for (feature_index, column) in columns.iter().enumerate() {
            if column.len() != n_samples {
                return Err(TreeError::LengthMismatch {
                    what: "feature column",
                    expected: n_samples,
                    got: column.len(),
                });
            }
            if let Some(sample_index) = column.iter().position(|v| !v.is_finite()) {
                return Err(TreeError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
            values.extend_from_slice(column);
        }

        Ok(Self {
            values,
            n_samples,
            n_features,
        })
    }

    /// Return the number of samples (rows).
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Return the number of features (columns).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the value of `feature` for `sample`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn value(&self, sample: usize, feature: usize) -> f64 {
        assert!(sample < self.n_samples, "sample index out of range");
        self.values[feature * self.n_samples + sample]
    }

    /// Return all sample values of one feature.
    #[must_use]
    pub fn column(&self, feature: usize) -> &[f64] {
        let start = feature * self.n_samples;
        &self.values[start..start + self.n_samples]
    }

    /// Copy one sample's feature vector.
    #[must_use]
    pub fn row(&self, sample: usize) -> Vec<f64> {
        (0..self.n_features)
            .map(|feature| self.value(sample, feature))
            .collect()
    }
}
