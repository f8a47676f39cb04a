//! Single-tree growth.
//!
//! Nodes are appended to a flat array and processed strictly in index order,
//! so the array doubles as a FIFO worklist: children are always appended
//! after their parent and no recursion or explicit stack is needed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument, warn};

use crate::criterion::{Criterion, SplitContext};
use crate::error::TreeError;
use crate::matrix::FeatureMatrix;
use crate::node::{FeatureIndex, Node, NodeIndex};
use crate::partition::Partitioner;
use crate::result::{GrowResult, GrowthSummary, NodeStats, TerminalReason};
use crate::sort_index::{SortIndex, WorkingOrder};
use crate::targets::Targets;
use crate::tree::RanTree;

/// Configuration for growing a single tree.
///
/// Construct via [`TreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default                  |
/// |-----------------|--------------------------|
/// | `criterion`     | `Gini`                   |
/// | `min_node_size` | 1                        |
/// | `n_try`         | 3                        |
/// | `max_nodes`     | `None` (`2N + 1`)        |
/// | `seed`          | 42                       |
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub(crate) criterion: Criterion,
    pub(crate) min_node_size: usize,
    pub(crate) n_try: usize,
    pub(crate) max_nodes: Option<usize>,
    pub(crate) seed: u64,
}

impl TreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: Criterion::Gini,
            min_node_size: 1,
            n_try: 3,
            max_nodes: None,
            seed: 42,
        }
    }

    /// Set the split criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the node size at or below which a node becomes terminal.
    ///
    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_min_node_size(mut self, min_node_size: usize) -> Self {
        if min_node_size < 1 {
            warn!(min_node_size, "min_node_size below 1, clamping to 1");
        }
        self.min_node_size = min_node_size.max(1);
        self
    }

    /// Set the number of features drawn (with replacement) per node.
    ///
    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_n_try(mut self, n_try: usize) -> Self {
        if n_try < 1 {
            warn!(n_try, "n_try below 1, clamping to 1");
        }
        self.n_try = n_try.max(1);
        self
    }

    /// Cap the node array below the default `2N + 1`.
    ///
    /// The cap is clamped into `[1, 2N + 1]` when growth starts.
    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: Option<usize>) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Set the seed used by [`TreeConfig::grow`].
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Return the minimum node size.
    #[must_use]
    pub fn min_node_size(&self) -> usize {
        self.min_node_size
    }

    /// Return the number of features drawn per node.
    #[must_use]
    pub fn n_try(&self) -> usize {
        self.n_try
    }

    /// Return the node cap, if set.
    #[must_use]
    pub fn max_nodes(&self) -> Option<usize> {
        self.max_nodes
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Grow a tree using a `ChaCha8Rng` seeded from [`TreeConfig::seed`].
    #[must_use]
    pub fn grow(&self, inputs: &GrowInputs<'_>) -> GrowResult {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.grow_with_rng(inputs, &mut rng)
    }

    /// Grow a tree drawing features from a caller-supplied RNG.
    ///
    /// Identical inputs and an identically seeded RNG produce an identical tree.
    #[instrument(
        skip_all,
        fields(
            n_samples = inputs.matrix.n_samples(),
            n_inbag = inputs.n_inbag,
            criterion = ?self.criterion,
        )
    )]
    pub fn grow_with_rng<R: Rng + ?Sized>(&self, inputs: &GrowInputs<'_>, rng: &mut R) -> GrowResult {
        let result = TreeBuilder::new(self, inputs).run(rng);

        let summary = result.summary();
        debug!(
            n_nodes = result.tree().n_nodes(),
            n_terminal = result.tree().n_terminal(),
            n_forced_terminal = summary.n_forced_terminal,
            "tree grown"
        );

        result
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated, borrowed inputs for growing one tree.
///
/// All shape and value checks happen here, before any working state is
/// created, so a rejected input never touches the shared arrays.
#[derive(Debug, Clone, Copy)]
pub struct GrowInputs<'a> {
    matrix: &'a FeatureMatrix,
    targets: &'a Targets,
    weights: &'a [f64],
    sort: &'a SortIndex,
    n_inbag: usize,
}

impl<'a> GrowInputs<'a> {
    /// Bundle and validate the inputs of one tree.
    ///
    /// `weights[i]` is sample `i`'s bootstrap multiplicity; `0` leaves it
    /// out of this tree.
    ///
    /// # Errors
    ///
    /// | Variant                           | When                                          |
    /// |-----------------------------------|-----------------------------------------------|
    /// | [`TreeError::LengthMismatch`]     | targets or weights do not have `N` entries    |
    /// | [`TreeError::SortIndexMismatch`]  | `sort` was built for a different shape        |
    /// | [`TreeError::InvalidWeight`]      | a weight is negative or not finite            |
    /// | [`TreeError::EmptyBag`]           | no weight is positive                         |
    pub fn new(
        matrix: &'a FeatureMatrix,
        targets: &'a Targets,
        weights: &'a [f64],
        sort: &'a SortIndex,
    ) -> Result<Self, TreeError> {
        let n_samples = matrix.n_samples();
        if targets.len() != n_samples {
            return Err(TreeError::LengthMismatch {
                what: "targets",
                expected: n_samples,
                got: targets.len(),
            });
        }
        if weights.len() != n_samples {
            return Err(TreeError::LengthMismatch {
                what: "weights",
                expected: n_samples,
                got: weights.len(),
            });
        }
        if sort.n_samples() != n_samples || sort.n_features() != matrix.n_features() {
            return Err(TreeError::SortIndexMismatch {
                index_samples: sort.n_samples(),
                index_features: sort.n_features(),
                matrix_samples: n_samples,
                matrix_features: matrix.n_features(),
            });
        }
        if let Some((sample_index, &weight)) = weights
            .iter()
            .enumerate()
            .find(|&(_, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(TreeError::InvalidWeight {
                sample_index,
                weight,
            });
        }
        let n_inbag = weights.iter().filter(|&&w| w > 0.0).count();
        if n_inbag == 0 {
            return Err(TreeError::EmptyBag);
        }

        Ok(Self {
            matrix,
            targets,
            weights,
            sort,
            n_inbag,
        })
    }

    /// Return the number of samples with positive weight.
    #[must_use]
    pub fn n_inbag(&self) -> usize {
        self.n_inbag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrowStatus {
    Pending,
    Split,
    Terminal(TerminalReason),
}

#[derive(Debug, Clone, Copy)]
struct SplitRecord {
    feature: FeatureIndex,
    /// Sample at the last left position and the first right position.
    sample: usize,
    next: usize,
    left: usize,
    right: usize,
    decrease: f64,
}

#[derive(Debug)]
struct GrowNode {
    start: usize,
    end: usize,
    status: GrowStatus,
    class_pop: Vec<f64>,
    sum: f64,
    sum_sq: f64,
    split: Option<SplitRecord>,
}

/// Owns the working order and node bookkeeping for one tree's growth.
struct TreeBuilder<'a> {
    config: &'a TreeConfig,
    matrix: &'a FeatureMatrix,
    targets: &'a Targets,
    weights: &'a [f64],
    sort: &'a SortIndex,
    order: WorkingOrder,
    partitioner: Partitioner,
    nodes: Vec<GrowNode>,
    capacity: usize,
    n_forced_terminal: usize,
    importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    fn new(config: &'a TreeConfig, inputs: &GrowInputs<'a>) -> Self {
        let n_samples = inputs.matrix.n_samples();
        let bound = 2 * n_samples + 1;
        let capacity = config.max_nodes.map_or(bound, |m| m.clamp(1, bound));

        let order = inputs.sort.working_copy(inputs.weights);
        let partitioner = Partitioner::new(n_samples, order.stride());

        let mut builder = Self {
            config,
            matrix: inputs.matrix,
            targets: inputs.targets,
            weights: inputs.weights,
            sort: inputs.sort,
            partitioner,
            nodes: Vec::with_capacity(capacity),
            capacity,
            n_forced_terminal: 0,
            importances: vec![0.0; inputs.matrix.n_features()],
            order,
        };
        let root = builder.pending_node(0, builder.order.stride());
        builder.nodes.push(root);
        builder
    }

    fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> GrowResult {
        let mut k = 0;
        while k < self.nodes.len() {
            if self.nodes[k].status == GrowStatus::Pending {
                self.process(k, rng);
            }
            k += 1;
        }
        self.finish()
    }

    /// Accumulate class populations and target sums over `[start, end)`.
    fn pending_node(&self, start: usize, end: usize) -> GrowNode {
        let mut class_pop = vec![0.0f64; self.targets.n_classes()];
        let (mut sum, mut sum_sq) = (0.0f64, 0.0f64);
        for &sample in &self.order.column(0)[start..end] {
            let w = self.weights[sample];
            let y = self.targets.values()[sample];
            class_pop[self.targets.classes()[sample]] += w;
            sum += w * y;
            sum_sq += w * y * y;
        }
        GrowNode {
            start,
            end,
            status: GrowStatus::Pending,
            class_pop,
            sum,
            sum_sq,
            split: None,
        }
    }

    fn process<R: Rng + ?Sized>(&mut self, k: usize, rng: &mut R) {
        let node = &self.nodes[k];
        let (start, end) = (node.start, node.end);

        if end - start <= self.config.min_node_size {
            self.nodes[k].status = GrowStatus::Terminal(TerminalReason::MinNodeSize);
            return;
        }
        if self.config.criterion.is_classification() && is_pure(&node.class_pop) {
            self.nodes[k].status = GrowStatus::Terminal(TerminalReason::Pure);
            return;
        }

        let ctx = SplitContext {
            order: &self.order,
            sort: self.sort,
            classes: self.targets.classes(),
            values: self.targets.values(),
            weights: self.weights,
            start,
            end,
            class_pop: &node.class_pop,
            sum: node.sum,
            sum_sq: node.sum_sq,
        };
        let Some(best) = self
            .config
            .criterion
            .find_best_split(&ctx, self.config.n_try, rng)
        else {
            self.nodes[k].status = GrowStatus::Terminal(TerminalReason::NoValidSplit);
            return;
        };

        if self.nodes.len() + 2 > self.capacity {
            if self.n_forced_terminal == 0 {
                warn!(capacity = self.capacity, "node capacity exhausted, remaining nodes become terminal");
            }
            self.n_forced_terminal += 1;
            self.nodes[k].status = GrowStatus::Terminal(TerminalReason::CapacityExhausted);
            return;
        }

        let column = self.order.column(best.feature.index());
        let (sample, next) = (column[best.position], column[best.position + 1]);
        let mid = self
            .partitioner
            .split(&mut self.order, start, end, best.feature, best.position);

        let left = self.nodes.len();
        let left_node = self.pending_node(start, mid);
        let right_node = self.pending_node(mid, end);
        self.nodes.push(left_node);
        self.nodes.push(right_node);

        self.importances[best.feature.index()] += best.decrease;

        let node = &mut self.nodes[k];
        node.status = GrowStatus::Split;
        node.split = Some(SplitRecord {
            feature: best.feature,
            sample,
            next,
            left,
            right: left + 1,
            decrease: best.decrease,
        });
    }

    /// Resolve thresholds and leaf values, then shrink to the created nodes.
    fn finish(self) -> GrowResult {
        let n_classes = self.targets.n_classes();
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut node_stats = Vec::with_capacity(self.nodes.len());

        for grow_node in &self.nodes {
            let weight: f64 = grow_node.class_pop.iter().sum();
            let class = majority_class(&grow_node.class_pop);

            let terminal_reason = match (grow_node.status, grow_node.split) {
                (GrowStatus::Split, Some(split)) => {
                    let f = split.feature.index();
                    // Midpoint between the two sorted values bounding the cut.
                    let threshold =
                        (self.matrix.value(split.sample, f) + self.matrix.value(split.next, f)) / 2.0;
                    nodes.push(Node::Split {
                        feature: split.feature,
                        threshold,
                        left: NodeIndex::new(split.left),
                        right: NodeIndex::new(split.right),
                        class,
                    });
                    None
                }
                (status, _) => {
                    nodes.push(Node::Terminal {
                        class,
                        value: grow_node.sum / weight,
                    });
                    match status {
                        GrowStatus::Terminal(reason) => Some(reason),
                        _ => Some(TerminalReason::CapacityExhausted),
                    }
                }
            };

            node_stats.push(NodeStats {
                n_samples: grow_node.end - grow_node.start,
                weight,
                weighted_sum: grow_node.sum,
                weighted_sum_sq: grow_node.sum_sq,
                class_weights: grow_node.class_pop.clone(),
                impurity_decrease: grow_node.split.map(|s| s.decrease),
                terminal_reason,
            });
        }

        let summary = GrowthSummary {
            criterion: self.config.criterion,
            n_samples: self.matrix.n_samples(),
            n_inbag: self.order.stride(),
            capacity: self.capacity,
            capacity_exhausted: self.n_forced_terminal > 0,
            n_forced_terminal: self.n_forced_terminal,
            feature_importances: self.importances,
            node_stats,
        };

        GrowResult::new(RanTree::from_nodes(nodes, n_classes), summary)
    }
}

/// All weight in a single class.
fn is_pure(class_pop: &[f64]) -> bool {
    let total: f64 = class_pop.iter().sum();
    class_pop.iter().any(|&w| w == total)
}

/// Class with the largest weight; the lowest id wins ties.
fn majority_class(class_pop: &[f64]) -> usize {
    let mut best = 0usize;
    let mut best_weight = 0.0f64;
    for (class, &w) in class_pop.iter().enumerate() {
        if w > best_weight {
            best = class;
            best_weight = w;
        }
    }
    best
}
