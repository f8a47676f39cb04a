//! End-to-end integration tests: CSV -> grow -> dump/JSON -> load -> predict.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use ranforest_io::{ExperimentName, IoError, ResultWriter, TableReader};
use ranforest_tree::{Criterion, GrowInputs, RanTree, SortIndex, Targets, TreeConfig};
use tempfile::TempDir;

/// Two informative features and one noise column; class 1 iff `a + b > 10`.
fn write_training_csv(dir: &Path, with_weights: bool) -> PathBuf {
    let mut csv = String::from(if with_weights { "a,noise,b,class,w\n" } else { "a,noise,b,class\n" });
    for i in 0..40 {
        let a = f64::from(i % 10);
        let b = f64::from(i / 4);
        let noise = f64::from((i * 7) % 13) / 13.0;
        let class = u8::from(a + b > 10.0);
        write!(csv, "{a},{noise},{b},{class}").unwrap();
        if with_weights {
            write!(csv, ",{}", i % 3).unwrap();
        }
        csv.push('\n');
    }
    let path = dir.join("train.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[test]
fn classification_round_trip() {
    let dir = TempDir::new().unwrap();
    let csv_path = write_training_csv(dir.path(), false);

    // 1. Read CSV
    let table = TableReader::new(&csv_path).with_target("class").read().unwrap();
    assert_eq!(table.n_samples(), 40);
    assert_eq!(table.feature_names(), &["a", "noise", "b"]);

    // 2. Grow
    let matrix = table.to_matrix().unwrap();
    let labels = table.class_labels().unwrap();
    let targets = Targets::classification(&labels, 2).unwrap();
    let weights = table.weights_or_unit();
    let sort = SortIndex::build(&matrix);
    let inputs = GrowInputs::new(&matrix, &targets, &weights, &sort).unwrap();
    let result = TreeConfig::new().with_n_try(3).with_seed(42).grow(&inputs);

    // 3. Write artifacts
    let out = dir.path().join("out");
    let writer = ResultWriter::new(&out, ExperimentName::new("clf_rt".into()).unwrap()).unwrap();
    let tree_path = writer.write_tree(result.tree()).unwrap();
    let grow_path = writer
        .write_growth(table.feature_names(), result.tree(), result.summary())
        .unwrap();

    // 4. Reload and compare
    let loaded = RanTree::load(&tree_path).unwrap();
    assert_eq!(&loaded, result.tree());

    let original = result.tree().predict_batch(table.features()).unwrap();
    let restored = loaded.predict_batch(table.features()).unwrap();
    assert_eq!(original, restored);

    // Fully grown on unit weights, so nearly every training row is recovered.
    let correct = table
        .features()
        .iter()
        .zip(&labels)
        .filter(|&(row, &label)| loaded.predict_class(row).unwrap() == label)
        .count();
    assert!(correct >= 30, "only {correct}/40 training rows recovered");

    let grow: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&grow_path).unwrap()).unwrap();
    assert_eq!(grow["experiment"], "clf_rt");
    assert_eq!(grow["n_inbag"], 40);
    assert_eq!(grow["n_nodes"], loaded.n_nodes());
    let importances = grow["feature_importances"].as_array().unwrap();
    assert_eq!(importances[1]["name"], "noise");
    let total: f64 = importances
        .iter()
        .map(|f| f["normalized"].as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-9);

    // 5. Predictions artifact
    let classes: Vec<usize> = table
        .features()
        .iter()
        .map(|row| loaded.predict_class(row).unwrap())
        .collect();
    let pred_path = writer
        .write_predictions(&restored, &classes, table.target())
        .unwrap();
    let preds: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&pred_path).unwrap()).unwrap();
    assert_eq!(preds["n_rows"], 40);
    assert_eq!(preds["predictions"].as_array().unwrap().len(), 40);
}

#[test]
fn weighted_regression_round_trip() {
    let dir = TempDir::new().unwrap();
    let csv_path = write_training_csv(dir.path(), true);

    let table = TableReader::new(&csv_path)
        .with_target("b")
        .with_weight(Some("w".into()))
        .read()
        .unwrap();
    assert_eq!(table.feature_names(), &["a", "noise", "class"]);

    let matrix = table.to_matrix().unwrap();
    let targets = Targets::regression(table.target().unwrap()).unwrap();
    let weights = table.weights_or_unit();
    let sort = SortIndex::build(&matrix);
    let inputs = GrowInputs::new(&matrix, &targets, &weights, &sort).unwrap();
    assert!(inputs.n_inbag() < 40);

    let result = TreeConfig::new()
        .with_criterion(Criterion::Variance)
        .with_min_node_size(3)
        .grow(&inputs);
    assert_eq!(result.summary().n_inbag, inputs.n_inbag());

    let writer =
        ResultWriter::new(dir.path(), ExperimentName::new("reg_rt".into()).unwrap()).unwrap();
    let loaded = RanTree::load(writer.write_tree(result.tree()).unwrap()).unwrap();
    assert_eq!(
        loaded.predict_batch(table.features()).unwrap(),
        result.tree().predict_batch(table.features()).unwrap()
    );

    // Leaf values are weighted means of the target, so they stay in range.
    let (lo, hi) = (0.0, 9.0);
    for value in loaded.predict_batch(table.features()).unwrap() {
        assert!((lo..=hi).contains(&value));
    }
}

#[test]
fn corrupted_dump_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad_tree.txt");
    fs::write(&path, "    3\n    0    1    1    2    0   0.5    0\n").unwrap();
    let err = RanTree::load(&path).unwrap_err();
    assert!(matches!(err, ranforest_tree::TreeError::ParseDump { .. }));
}

#[test]
fn fractional_labels_rejected_for_classification() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frac.csv");
    fs::write(&path, "x,y\n1,0\n2,0.5\n").unwrap();
    let table = TableReader::new(&path).with_target("y").read().unwrap();
    assert!(matches!(
        table.class_labels(),
        Err(IoError::InvalidClassLabel { row_index: 1, .. })
    ));
}
