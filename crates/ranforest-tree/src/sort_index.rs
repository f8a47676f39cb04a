//! Per-feature sample orderings shared by every tree of a forest.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::matrix::FeatureMatrix;

/// Sample indices sorted by each feature, plus a dense rank per value.
///
/// Built once per dataset and shared read-only across trees. `order(f)`
/// lists all samples in ascending order of feature `f` (ties keep sample
/// order). `rank(f, i)` is equal for two samples exactly when their values
/// of `f` are equal, which makes tie detection a single integer comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortIndex {
    order: Vec<usize>,
    rank: Vec<usize>,
    n_samples: usize,
    n_features: usize,
}

impl SortIndex {
    /// Sort every feature column of `matrix`.
    ///
    /// Columns are sorted in parallel.
    #[instrument(skip_all, fields(n_samples = matrix.n_samples(), n_features = matrix.n_features()))]
    #[must_use]
    pub fn build(matrix: &FeatureMatrix) -> Self {
        let n_samples = matrix.n_samples();
        let n_features = matrix.n_features();

        let per_feature: Vec<(Vec<usize>, Vec<usize>)> = (0..n_features)
            .into_par_iter()
            .map(|feature| {
                let column = matrix.column(feature);
                let mut order: Vec<usize> = (0..n_samples).collect();
                order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

                let mut rank = vec![0usize; n_samples];
                let mut current = 0usize;
                for pos in 1..n_samples {
                    if column[order[pos]] != column[order[pos - 1]] {
                        current += 1;
                    }
                    rank[order[pos]] = current;
                }
                (order, rank)
            })
            .collect();

        let mut order = Vec::with_capacity(n_samples * n_features);
        let mut rank = Vec::with_capacity(n_samples * n_features);
        for (o, r) in per_feature {
            order.extend(o);
            rank.extend(r);
        }

        debug!("sort index built");

        Self {
            order,
            rank,
            n_samples,
            n_features,
        }
    }

    /// Return the number of samples covered.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Return the number of features covered.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return all samples in ascending order of `feature`.
    #[must_use]
    pub fn order(&self, feature: usize) -> &[usize] {
        let start = feature * self.n_samples;
        &self.order[start..start + self.n_samples]
    }

    /// Return the dense rank of `sample`'s value of `feature`.
    #[must_use]
    pub fn rank(&self, feature: usize, sample: usize) -> usize {
        self.rank[feature * self.n_samples + sample]
    }

    /// Derive a tree's working order: every feature's order restricted to
    /// in-bag samples (positive weight), in the same relative order.
    pub(crate) fn working_copy(&self, weights: &[f64]) -> WorkingOrder {
        let n_inbag = weights.iter().filter(|&&w| w > 0.0).count();
        let mut order = Vec::with_capacity(n_inbag * self.n_features);
        for feature in 0..self.n_features {
            order.extend(self.order(feature).iter().copied().filter(|&s| weights[s] > 0.0));
        }
        WorkingOrder {
            order,
            stride: n_inbag,
        }
    }
}

/// A tree's private, mutable copy of the sort order.
///
/// Laid out feature-major with `stride` in-bag samples per feature. During
/// growth every node owns a contiguous range `[start, end)` that is the
/// same sample set in every feature column, sorted by that feature.
#[derive(Debug, Clone)]
pub(crate) struct WorkingOrder {
    order: Vec<usize>,
    stride: usize,
}

impl WorkingOrder {
    /// Number of in-bag samples per feature column.
    pub(crate) fn stride(&self) -> usize {
        self.stride
    }

    /// In-bag samples sorted by `feature`, restricted to node ranges by the caller.
    pub(crate) fn column(&self, feature: usize) -> &[usize] {
        let start = feature * self.stride;
        &self.order[start..start + self.stride]
    }

    /// Mutable access to every feature column at once.
    pub(crate) fn columns_mut(&mut self) -> std::slice::ChunksExactMut<'_, usize> {
        self.order.chunks_exact_mut(self.stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        FeatureMatrix::from_columns(&[
            vec![3.0, 1.0, 2.0, 1.0],
            vec![0.5, 0.5, 0.5, 0.5],
        ])
        .unwrap()
    }

    #[test]
    fn order_is_ascending_and_stable() {
        let index = SortIndex::build(&matrix());
        assert_eq!(index.order(0), &[1, 3, 2, 0]);
        assert_eq!(index.order(1), &[0, 1, 2, 3]);
    }

    #[test]
    fn ranks_share_ties() {
        let index = SortIndex::build(&matrix());
        assert_eq!(index.rank(0, 1), index.rank(0, 3));
        assert!(index.rank(0, 3) < index.rank(0, 2));
        assert!(index.rank(0, 2) < index.rank(0, 0));
        assert!((0..4).all(|s| index.rank(1, s) == 0));
    }

    #[test]
    fn working_copy_drops_out_of_bag() {
        let index = SortIndex::build(&matrix());
        let work = index.working_copy(&[1.0, 0.0, 2.0, 1.0]);
        assert_eq!(work.stride(), 3);
        assert_eq!(work.column(0), &[3, 2, 0]);
        assert_eq!(work.column(1), &[0, 2, 3]);
    }
}
