//! Split search: Gini for classification, weighted variance for regression.
//!
//! Both criteria scan each drawn feature once over the node's sorted range,
//! updating left/right statistics incrementally as samples move across the
//! candidate boundary. A boundary is only legal where the feature value
//! strictly increases.

use rand::Rng;

use crate::node::FeatureIndex;
use crate::sort_index::{SortIndex, WorkingOrder};

/// Impurity objective, chosen once per forest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    serde::Serialize, serde::Deserialize,
)]
pub enum Criterion {
    /// Weighted Gini: maximise `Σ_children Σ_c w_c² / Σ_c w_c`.
    #[default]
    Gini,
    /// Weighted sum of squares: minimise the children's centred `Σ w·(y - ȳ)²`.
    Variance,
}

impl Criterion {
    /// Return `true` for the classification criterion.
    ///
    /// Classification growth also stops at class-pure nodes.
    #[must_use]
    pub fn is_classification(self) -> bool {
        matches!(self, Criterion::Gini)
    }

    /// Find the best split of one node over `n_try` randomly drawn features.
    ///
    /// Features are drawn uniformly with replacement from `[0, M)`. Returns
    /// `None` when no drawn feature has a legal boundary, or when the best
    /// decrease is negative or not finite.
    pub(crate) fn find_best_split<R: Rng + ?Sized>(
        self,
        ctx: &SplitContext<'_>,
        n_try: usize,
        rng: &mut R,
    ) -> Option<BestSplit> {
        if ctx.end - ctx.start < 2 {
            return None;
        }
        match self {
            Criterion::Gini => best_split_gini(ctx, n_try, rng),
            Criterion::Variance => best_split_variance(ctx, n_try, rng),
        }
    }
}

/// Outcome of a successful split search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestSplit {
    /// Feature to split on.
    pub feature: FeatureIndex,
    /// Absolute position in the working order of the last sample going left.
    pub position: usize,
    /// Impurity decrease achieved; always finite and `>= 0`.
    pub decrease: f64,
}

impl BestSplit {
    fn accept(feature: usize, position: usize, decrease: f64) -> Option<Self> {
        if !decrease.is_finite() || decrease < 0.0 {
            return None;
        }
        Some(Self {
            feature: FeatureIndex::new(feature),
            position,
            decrease,
        })
    }
}

/// Everything a split search reads about one node.
pub(crate) struct SplitContext<'a> {
    pub(crate) order: &'a WorkingOrder,
    pub(crate) sort: &'a SortIndex,
    pub(crate) classes: &'a [usize],
    pub(crate) values: &'a [f64],
    pub(crate) weights: &'a [f64],
    /// Node range `[start, end)` in the working order.
    pub(crate) start: usize,
    pub(crate) end: usize,
    /// Weighted class populations of the node.
    pub(crate) class_pop: &'a [f64],
    /// `Σ w·y` over the node.
    pub(crate) sum: f64,
    /// `Σ w·y²` over the node.
    pub(crate) sum_sq: f64,
}

impl SplitContext<'_> {
    fn boundary_is_legal(&self, feature: usize, sample: usize, next: usize) -> bool {
        self.sort.rank(feature, sample) < self.sort.rank(feature, next)
    }
}

fn best_split_gini<R: Rng + ?Sized>(
    ctx: &SplitContext<'_>,
    n_try: usize,
    rng: &mut R,
) -> Option<BestSplit> {
    let n_features = ctx.sort.n_features();

    // Gini index of a side is num/den with num = Σ w_c², den = Σ w_c.
    let pno: f64 = ctx.class_pop.iter().map(|w| w * w).sum();
    let pdo: f64 = ctx.class_pop.iter().sum();
    let crit0 = pno / pdo;

    let mut crit_max = f64::NEG_INFINITY;
    let mut best: Option<(usize, usize)> = None;
    let mut wl = vec![0.0f64; ctx.class_pop.len()];
    let mut wr = ctx.class_pop.to_vec();

    for _ in 0..n_try {
        let feature = rng.gen_range(0..n_features);
        let column = &ctx.order.column(feature)[ctx.start..ctx.end];

        let (mut rln, mut rld) = (0.0f64, 0.0f64);
        let (mut rrn, mut rrd) = (pno, pdo);
        wl.fill(0.0);
        wr.copy_from_slice(ctx.class_pop);

        let mut crit_var = f64::NEG_INFINITY;
        let mut pos_var = None;
        for pos in 0..column.len() - 1 {
            let sample = column[pos];
            let k = ctx.classes[sample];
            let u = ctx.weights[sample];

            // (w + u)² - w² on the left, w² - (w - u)² on the right.
            rln += u * (2.0 * wl[k] + u);
            rld += u;
            wl[k] += u;
            rrn -= u * (2.0 * wr[k] - u);
            rrd -= u;
            wr[k] -= u;

            if !ctx.boundary_is_legal(feature, sample, column[pos + 1]) {
                continue;
            }

            let crit = rln / rld + rrn / rrd;
            if !crit.is_finite() || crit <= crit_var {
                continue;
            }
            crit_var = crit;
            pos_var = Some(pos);
        }

        if let Some(pos) = pos_var
            && crit_var > crit_max
        {
            crit_max = crit_var;
            best = Some((feature, pos));
        }
    }

    let (feature, pos) = best?;
    BestSplit::accept(feature, ctx.start + pos, crit_max - crit0)
}

fn best_split_variance<R: Rng + ?Sized>(
    ctx: &SplitContext<'_>,
    n_try: usize,
    rng: &mut R,
) -> Option<BestSplit> {
    let n_features = ctx.sort.n_features();

    let total: f64 = ctx.class_pop.iter().sum();
    let crit0 = ctx.sum_sq - ctx.sum * ctx.sum / total;

    let mut crit_min = f64::INFINITY;
    let mut best: Option<(usize, usize)> = None;

    for _ in 0..n_try {
        let feature = rng.gen_range(0..n_features);
        let column = &ctx.order.column(feature)[ctx.start..ctx.end];

        let (mut esuml, mut e2suml, mut wl) = (0.0f64, 0.0f64, 0.0f64);
        let (mut esumr, mut e2sumr, mut wr) = (ctx.sum, ctx.sum_sq, total);

        let mut crit_var = crit_min;
        let mut pos_var = None;
        for pos in 0..column.len() - 1 {
            let sample = column[pos];
            let y = ctx.values[sample];
            let u = ctx.weights[sample];

            e2suml += u * y * y;
            esuml += u * y;
            wl += u;
            e2sumr -= u * y * y;
            esumr -= u * y;
            wr -= u;

            if !ctx.boundary_is_legal(feature, sample, column[pos + 1]) {
                continue;
            }

            let crit = (e2suml - esuml * esuml / wl) + (e2sumr - esumr * esumr / wr);
            if !crit.is_finite() || crit >= crit_var {
                continue;
            }
            crit_var = crit;
            pos_var = Some(pos);
        }

        if let Some(pos) = pos_var {
            crit_min = crit_var;
            best = Some((feature, pos));
        }
    }

    let (feature, pos) = best?;
    BestSplit::accept(feature, ctx.start + pos, crit0 - crit_min)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::matrix::FeatureMatrix;
    use crate::targets::Targets;

    struct Fixture {
        sort: SortIndex,
        order: WorkingOrder,
        targets: Targets,
        weights: Vec<f64>,
    }

    impl Fixture {
        fn new(columns: &[Vec<f64>], targets: Targets) -> Self {
            let matrix = FeatureMatrix::from_columns(columns).unwrap();
            let sort = SortIndex::build(&matrix);
            let weights = vec![1.0; matrix.n_samples()];
            let order = sort.working_copy(&weights);
            Self {
                sort,
                order,
                targets,
                weights,
            }
        }

        fn search(&self, criterion: Criterion) -> Option<BestSplit> {
            let mut class_pop = vec![0.0; self.targets.n_classes()];
            let (mut sum, mut sum_sq) = (0.0, 0.0);
            for (i, &w) in self.weights.iter().enumerate() {
                let y = self.targets.values()[i];
                class_pop[self.targets.classes()[i]] += w;
                sum += w * y;
                sum_sq += w * y * y;
            }
            let ctx = SplitContext {
                order: &self.order,
                sort: &self.sort,
                classes: self.targets.classes(),
                values: self.targets.values(),
                weights: &self.weights,
                start: 0,
                end: self.order.stride(),
                class_pop: &class_pop,
                sum,
                sum_sq,
            };
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            criterion.find_best_split(&ctx, 3, &mut rng)
        }
    }

    #[test]
    fn gini_separable_split() {
        let fx = Fixture::new(
            &[vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]],
            Targets::classification(&[0, 0, 0, 1, 1, 1], 2).unwrap(),
        );
        let split = fx.search(Criterion::Gini).expect("should find a split");
        assert_eq!(split.feature.index(), 0);
        assert_eq!(split.position, 2);
        // crit0 = (9 + 9) / 6 = 3, crit = 9/3 + 9/3 = 6
        assert!((split.decrease - 3.0).abs() < 1e-12);
    }

    #[test]
    fn gini_never_cuts_through_ties() {
        // Cutting between the two 2.0 values would be perfect but is illegal.
        let fx = Fixture::new(
            &[vec![1.0, 2.0, 2.0, 3.0]],
            Targets::classification(&[0, 0, 1, 1], 2).unwrap(),
        );
        let split = fx.search(Criterion::Gini).expect("should find a split");
        assert_eq!(split.position, 0);
    }

    #[test]
    fn constant_feature_has_no_split() {
        let fx = Fixture::new(
            &[vec![5.0, 5.0, 5.0, 5.0]],
            Targets::classification(&[0, 0, 1, 1], 2).unwrap(),
        );
        assert!(fx.search(Criterion::Gini).is_none());
        assert!(fx.search(Criterion::Variance).is_none());
    }

    #[test]
    fn variance_separable_split() {
        let fx = Fixture::new(
            &[vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]],
            Targets::regression(&[1.0, 1.0, 1.0, 5.0, 5.0, 5.0]).unwrap(),
        );
        let split = fx.search(Criterion::Variance).expect("should find a split");
        assert_eq!(split.position, 2);
        // crit0 = 78 - 18² / 6 = 24, both children have zero spread
        assert!((split.decrease - 24.0).abs() < 1e-9);
    }

    #[test]
    fn weights_shift_the_gini_optimum() {
        // Unit weights cut after sample 0; heavy weight on sample 2 moves the cut.
        let columns = [vec![1.0, 2.0, 3.0, 4.0]];
        let targets = Targets::classification(&[0, 1, 0, 1], 2).unwrap();
        let mut fx = Fixture::new(&columns, targets);
        let unit = fx.search(Criterion::Gini).unwrap();

        fx.weights = vec![1.0, 1.0, 10.0, 1.0];
        let weighted = fx.search(Criterion::Gini).unwrap();
        assert_ne!(unit.position, weighted.position);
        assert!(weighted.decrease >= 0.0);
    }

    #[test]
    fn draws_only_the_legal_feature() {
        // Feature 1 is constant; whichever draw hits feature 0 must win.
        let fx = Fixture::new(
            &[vec![1.0, 2.0, 3.0, 4.0], vec![7.0, 7.0, 7.0, 7.0]],
            Targets::classification(&[0, 0, 1, 1], 2).unwrap(),
        );
        if let Some(split) = fx.search(Criterion::Gini) {
            assert_eq!(split.feature.index(), 0);
            assert_eq!(split.position, 1);
        }
    }
}
