//! Criterion benchmarks for ranforest-tree: single-tree growth and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use ranforest_tree::{
    Criterion as SplitCriterion, FeatureMatrix, GrowInputs, SortIndex, Targets, TreeConfig,
};

struct Dataset {
    rows: Vec<Vec<f64>>,
    matrix: FeatureMatrix,
    labels: Targets,
    responses: Targets,
    weights: Vec<f64>,
    sort: SortIndex,
}

/// Features 0-2 carry the class, the rest are noise. Weights mimic a
/// bootstrap draw: each sample appears 0-3 times.
fn make_dataset(n_samples: usize, n_features: usize, n_classes: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    let mut responses = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                base + rng.r#gen::<f64>() * 0.5
            })
            .collect();
        responses.push(row[0] * 2.0 + row[1] - row[2]);
        rows.push(row);
    }
    let weights: Vec<f64> = (0..n_samples)
        .map(|_| f64::from(rng.gen_range(0..4u8)))
        .collect();

    let matrix = FeatureMatrix::from_rows(&rows).unwrap();
    let sort = SortIndex::build(&matrix);
    Dataset {
        labels: Targets::classification(&labels, n_classes).unwrap(),
        responses: Targets::regression(&responses).unwrap(),
        rows,
        matrix,
        weights,
        sort,
    }
}

fn bench_sort_index(c: &mut Criterion) {
    let data = make_dataset(2000, 20, 5, 42);

    c.bench_function("sort_index_2000x20", |b| {
        b.iter(|| SortIndex::build(&data.matrix));
    });
}

fn bench_grow_gini(c: &mut Criterion) {
    let data = make_dataset(2000, 20, 5, 42);
    let inputs = GrowInputs::new(&data.matrix, &data.labels, &data.weights, &data.sort).unwrap();
    let cfg = TreeConfig::new().with_n_try(4).with_seed(42);

    c.bench_function("grow_gini_2000x20_5class", |b| {
        b.iter(|| cfg.grow(&inputs));
    });
}

fn bench_grow_variance(c: &mut Criterion) {
    let data = make_dataset(2000, 20, 5, 42);
    let inputs =
        GrowInputs::new(&data.matrix, &data.responses, &data.weights, &data.sort).unwrap();
    let cfg = TreeConfig::new()
        .with_criterion(SplitCriterion::Variance)
        .with_min_node_size(5)
        .with_n_try(7)
        .with_seed(42);

    c.bench_function("grow_variance_2000x20", |b| {
        b.iter(|| cfg.grow(&inputs));
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let data = make_dataset(2000, 20, 5, 42);
    let inputs = GrowInputs::new(&data.matrix, &data.labels, &data.weights, &data.sort).unwrap();
    let tree = TreeConfig::new().with_seed(42).grow(&inputs).into_tree();

    c.bench_function("predict_batch_2000x20", |b| {
        b.iter(|| tree.predict_batch(&data.rows).unwrap());
    });
}

criterion_group!(
    benches,
    bench_sort_index,
    bench_grow_gini,
    bench_grow_variance,
    bench_predict_batch
);
criterion_main!(benches);
