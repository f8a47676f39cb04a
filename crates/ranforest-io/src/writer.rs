//! Result writer for grown trees, growth summaries and predictions.

use std::fs;
use std::path::{Path, PathBuf};

use ranforest_tree::{Criterion, GrowthSummary, NodeStats, RanTree};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes tree dumps and JSON artifacts for one experiment.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_tree.txt`, `{experiment}_grow.json`
/// and `{experiment}_predictions.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return `{output_dir}/{experiment}_tree.txt` without writing anything.
    #[must_use]
    pub fn tree_path(&self) -> PathBuf {
        self.artifact_path("tree.txt")
    }

    /// Write the text dump of `tree` to `{experiment}_tree.txt`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_tree(&self, tree: &RanTree) -> Result<PathBuf, IoError> {
        let path = self.tree_path();
        fs::write(&path, tree.to_dump_string()).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), n_nodes = tree.n_nodes(), "tree dump written");
        Ok(path)
    }

    /// Write the growth summary to `{experiment}_grow.json`.
    ///
    /// `feature_names` label the importance entries; it must list the
    /// features in matrix column order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | a statistic cannot be encoded |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all)]
    pub fn write_growth(
        &self,
        feature_names: &[String],
        tree: &RanTree,
        summary: &GrowthSummary,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("grow.json");

        let normalized = summary.normalized_importances();
        let feature_importances: Vec<FeatureEntry> = feature_names
            .iter()
            .zip(&summary.feature_importances)
            .zip(&normalized)
            .map(|((name, &importance), &normalized)| FeatureEntry {
                name: name.as_str(),
                importance,
                normalized,
            })
            .collect();

        let artifact = GrowArtifact {
            experiment: self.experiment.as_str(),
            criterion: summary.criterion,
            n_samples: summary.n_samples,
            n_inbag: summary.n_inbag,
            n_nodes: tree.n_nodes(),
            n_terminal: tree.n_terminal(),
            depth: tree.depth(),
            capacity: summary.capacity,
            capacity_exhausted: summary.capacity_exhausted,
            n_forced_terminal: summary.n_forced_terminal,
            feature_importances,
            nodes: &summary.node_stats,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "growth summary written");
        Ok(path)
    }

    /// Write predictions to `{experiment}_predictions.json`.
    ///
    /// `actual` carries the table's target values when it had one.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | a value cannot be encoded |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all, fields(n_rows = values.len()))]
    pub fn write_predictions(
        &self,
        values: &[f64],
        classes: &[usize],
        actual: Option<&[f64]>,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("predictions.json");

        let predictions: Vec<PredictionEntry> = values
            .iter()
            .zip(classes)
            .enumerate()
            .map(|(row, (&value, &class))| PredictionEntry {
                row,
                value,
                class,
                actual: actual.and_then(|a| a.get(row).copied()),
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: predictions.len(),
            predictions,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }

    fn write_json(&self, path: &Path, artifact: &impl Serialize) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::SerializeJson {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct GrowArtifact<'a> {
    experiment: &'a str,
    criterion: Criterion,
    n_samples: usize,
    n_inbag: usize,
    n_nodes: usize,
    n_terminal: usize,
    depth: usize,
    capacity: usize,
    capacity_exhausted: bool,
    n_forced_terminal: usize,
    feature_importances: Vec<FeatureEntry<'a>>,
    nodes: &'a [NodeStats],
}

#[derive(Serialize)]
struct FeatureEntry<'a> {
    name: &'a str,
    importance: f64,
    normalized: f64,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    predictions: Vec<PredictionEntry>,
}

#[derive(Serialize)]
struct PredictionEntry {
    row: usize,
    value: f64,
    class: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ranforest_tree::{FeatureMatrix, GrowInputs, GrowResult, SortIndex, Targets, TreeConfig};
    use tempfile::TempDir;

    fn grow_small() -> GrowResult {
        let rows = vec![
            vec![1.0, 0.5],
            vec![2.0, 0.1],
            vec![3.0, 0.9],
            vec![10.0, 0.3],
            vec![11.0, 0.7],
            vec![12.0, 0.2],
        ];
        let matrix = FeatureMatrix::from_rows(&rows).unwrap();
        let targets = Targets::classification(&[0, 0, 0, 1, 1, 1], 2).unwrap();
        let weights = vec![1.0; 6];
        let sort = SortIndex::build(&matrix);
        let inputs = GrowInputs::new(&matrix, &targets, &weights, &sort).unwrap();
        TreeConfig::new().with_seed(42).grow(&inputs)
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn write_growth_json_structure() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("grow_test".into()).unwrap();
        let writer = ResultWriter::new(dir.path(), experiment).unwrap();

        let result = grow_small();
        let names = vec!["x".to_string(), "noise".to_string()];
        let path = writer
            .write_growth(&names, result.tree(), result.summary())
            .unwrap();
        assert_eq!(path, dir.path().join("grow_test_grow.json"));

        let content = read_json(&path);
        assert_eq!(content["experiment"], "grow_test");
        assert_eq!(content["criterion"], "Gini");
        assert_eq!(content["n_samples"], 6);
        assert_eq!(content["n_inbag"], 6);
        assert_eq!(content["capacity"], 13);
        assert_eq!(content["capacity_exhausted"], false);
        assert_eq!(content["n_nodes"], result.tree().n_nodes());

        let features = content["feature_importances"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["name"], "x");
        let nodes = content["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), result.tree().n_nodes());
        assert_eq!(nodes[0]["n_samples"], 6);
    }

    #[test]
    fn write_tree_is_loadable() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("tree_test".into()).unwrap();
        let writer = ResultWriter::new(dir.path(), experiment).unwrap();

        let result = grow_small();
        let path = writer.write_tree(result.tree()).unwrap();
        assert_eq!(path, writer.tree_path());
        assert_eq!(&RanTree::load(&path).unwrap(), result.tree());
    }

    #[test]
    fn write_predictions_with_and_without_actual() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("pred_test".into()).unwrap();
        let writer = ResultWriter::new(dir.path(), experiment).unwrap();

        let path = writer
            .write_predictions(&[0.0, 1.0], &[0, 1], Some(&[0.0, 0.0]))
            .unwrap();
        let content = read_json(&path);
        assert_eq!(content["n_rows"], 2);
        assert_eq!(content["predictions"][1]["class"], 1);
        assert_eq!(content["predictions"][1]["actual"], 0.0);

        writer.write_predictions(&[0.5], &[0], None).unwrap();
        let content = read_json(&path);
        assert!(content["predictions"][0].get("actual").is_none());
    }

    #[test]
    fn writer_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("deep");
        let experiment = ExperimentName::new("nested_test".into()).unwrap();
        let writer = ResultWriter::new(&nested, experiment).unwrap();

        writer.write_tree(grow_small().tree()).unwrap();
        assert!(nested.join("nested_test_tree.txt").exists());
    }
}
