//! CSV training-table reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::TrainingTable;

/// Reads a headered CSV of floats into a [`TrainingTable`].
///
/// Expected CSV format:
/// - Header row required, one name per column
/// - `feature1,feature2,...,target[,weight]` in any column order
/// - Every cell a finite float, all rows the same length
///
/// The target and weight columns are picked by name; every other column is
/// a feature, kept in file order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | Target or weight column not in header |
/// | [`IoError::NoFeatureColumns`] | Only target/weight columns present |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
pub struct TableReader {
    path: PathBuf,
    target: Option<String>,
    weight: Option<String>,
}

impl TableReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            target: None,
            weight: None,
        }
    }

    /// Name the target column.
    #[must_use]
    pub fn with_target(mut self, name: impl Into<String>) -> Self {
        self.target = Some(name.into());
        self
    }

    /// Name the bootstrap weight column, if any.
    #[must_use]
    pub fn with_weight(mut self, name: Option<String>) -> Self {
        self.weight = name;
        self
    }

    /// Read and validate the CSV file, returning a [`TrainingTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<TrainingTable, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that our own InconsistentRowLength check fires
        // instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header: Vec<String> = rdr
            .headers()
            .map_err(|e| self.csv_error(e))?
            .iter()
            .map(String::from)
            .collect();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let target_col = self.column_index(&header, self.target.as_deref())?;
        let weight_col = self.column_index(&header, self.weight.as_deref())?;

        let feature_cols: Vec<usize> = (0..expected_cols)
            .filter(|&c| Some(c) != target_col && Some(c) != weight_col)
            .collect();
        if feature_cols.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        let feature_names: Vec<String> = feature_cols.iter().map(|&c| header[c].clone()).collect();

        let mut features = Vec::new();
        let mut target = target_col.map(|_| Vec::new());
        let mut weights = weight_col.map(|_| Vec::new());

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut values = Vec::with_capacity(expected_cols);
            for (col_index, raw) in record.iter().enumerate() {
                values.push(self.parse_cell(row_index, &header[col_index], raw)?);
            }

            features.push(feature_cols.iter().map(|&c| values[c]).collect::<Vec<f64>>());
            if let (Some(col), Some(column)) = (target_col, target.as_mut()) {
                column.push(values[col]);
            }
            if let (Some(col), Some(column)) = (weight_col, weights.as_mut()) {
                column.push(values[col]);
            }
        }

        if features.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = features.len(),
            n_features = feature_names.len(),
            has_target = target.is_some(),
            has_weights = weights.is_some(),
            "training table loaded"
        );

        Ok(TrainingTable::new(
            feature_names,
            features,
            self.target.clone(),
            target,
            weights,
        ))
    }

    fn column_index(&self, header: &[String], name: Option<&str>) -> Result<Option<usize>, IoError> {
        let Some(name) = name else {
            return Ok(None);
        };
        header
            .iter()
            .position(|h| h == name)
            .map(Some)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    fn parse_cell(&self, row_index: usize, column: &str, raw: &str) -> Result<f64, IoError> {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                column: column.to_string(),
                raw: raw.to_string(),
            })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
