//! Stable in-place partition of a node's range across all feature orders.

use crate::node::FeatureIndex;
use crate::sort_index::WorkingOrder;

/// Reusable buffers for moving a node's samples into two contiguous children.
///
/// One pass per feature over a temporary buffer, so a split costs
/// `O(M · (end - start))` and never re-sorts.
#[derive(Debug)]
pub(crate) struct Partitioner {
    goes_left: Vec<bool>,
    scratch: Vec<usize>,
}

impl Partitioner {
    /// Buffers sized for `n_samples` sample ids and `n_inbag` positions.
    pub(crate) fn new(n_samples: usize, n_inbag: usize) -> Self {
        Self {
            goes_left: vec![false; n_samples],
            scratch: vec![0; n_inbag],
        }
    }

    /// Split `[start, end)` after `position` in the order of `feature`.
    ///
    /// Samples at sorted positions `<= position` of `feature` go left. Every
    /// feature column is reordered so the left samples precede the right
    /// ones, each side keeping its sort order. Returns the boundary: the left
    /// child is `[start, mid)` and the right child `[mid, end)`.
    pub(crate) fn split(
        &mut self,
        order: &mut WorkingOrder,
        start: usize,
        end: usize,
        feature: FeatureIndex,
        position: usize,
    ) -> usize {
        debug_assert!(start <= position && position + 1 < end);
        let Self { goes_left, scratch } = self;

        let split_column = order.column(feature.index());
        for (pos, &sample) in split_column[start..end].iter().enumerate() {
            goes_left[sample] = start + pos <= position;
        }

        for column in order.columns_mut() {
            let range = &mut column[start..end];
            let buffer = &mut scratch[..range.len()];
            let mut k = 0;
            for &sample in range.iter().filter(|&&s| goes_left[s]) {
                buffer[k] = sample;
                k += 1;
            }
            for &sample in range.iter().filter(|&&s| !goes_left[s]) {
                buffer[k] = sample;
                k += 1;
            }
            range.copy_from_slice(buffer);
        }

        position + 1
    }
}
