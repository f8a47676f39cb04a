//! Per-sample training targets.

use crate::error::TreeError;

/// The parallel target arrays consumed by growth.
///
/// `values` is the real-valued target averaged into every leaf; `classes`
/// holds class ids used by the Gini criterion and for leaf classes. In
/// regression every class id is `0` and `n_classes` is `1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Targets {
    values: Vec<f64>,
    classes: Vec<usize>,
    n_classes: usize,
}

impl Targets {
    /// Classification targets: the value of each sample is its class id.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                          |
    /// |----------------------------------|-------------------------------|
    /// | [`TreeError::ZeroClasses`]       | `n_classes` is zero           |
    /// | [`TreeError::ClassOutOfRange`]   | a label is `>= n_classes`     |
    pub fn classification(labels: &[usize], n_classes: usize) -> Result<Self, TreeError> {
        let values = labels.iter().map(|&c| c as f64).collect();
        Self::from_parts(values, labels.to_vec(), n_classes)
    }

    /// Regression targets with a single pseudo-class.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NonFiniteTarget`] if any value is NaN or infinite.
    pub fn regression(values: &[f64]) -> Result<Self, TreeError> {
        Self::from_parts(values.to_vec(), vec![0; values.len()], 1)
    }

    /// Targets from explicit value and class arrays.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                                |
    /// |----------------------------------|-------------------------------------|
    /// | [`TreeError::ZeroClasses`]       | `n_classes` is zero                 |
    /// | [`TreeError::LengthMismatch`]    | `classes.len() != values.len()`     |
    /// | [`TreeError::NonFiniteTarget`]   | a value is NaN or infinite          |
    /// | [`TreeError::ClassOutOfRange`]   | a class id is `>= n_classes`        |
    pub fn from_parts(
        values: Vec<f64>,
        classes: Vec<usize>,
        n_classes: usize,
    ) -> Result<Self, TreeError> {
        if n_classes == 0 {
            return Err(TreeError::ZeroClasses);
        }
        if classes.len() != values.len() {
            return Err(TreeError::LengthMismatch {
                what: "class ids",
                expected: values.len(),
                got: classes.len(),
            });
        }
        if let Some(sample_index) = values.iter().position(|v| !v.is_finite()) {
            return Err(TreeError::NonFiniteTarget { sample_index });
        }
        if let Some((sample_index, &class)) =
            classes.iter().enumerate().find(|&(_, &c)| c >= n_classes)
        {
            return Err(TreeError::ClassOutOfRange {
                sample_index,
                class,
                n_classes,
            });
        }
        Ok(Self {
            values,
            classes,
            n_classes,
        })
    }

    /// Return the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` when there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the real-valued targets.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Return the class ids.
    #[must_use]
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_mirrors_labels() {
        let t = Targets::classification(&[0, 1, 1], 2).unwrap();
        assert_eq!(t.values(), &[0.0, 1.0, 1.0]);
        assert_eq!(t.classes(), &[0, 1, 1]);
        assert_eq!(t.n_classes(), 2);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn regression_uses_one_class() {
        let t = Targets::regression(&[0.5, 2.5]).unwrap();
        assert_eq!(t.classes(), &[0, 0]);
        assert_eq!(t.n_classes(), 1);
    }

    #[test]
    fn class_out_of_range_rejected() {
        let err = Targets::classification(&[0, 2], 2).unwrap_err();
        assert!(matches!(
            err,
            TreeError::ClassOutOfRange { sample_index: 1, class: 2, n_classes: 2 }
        ));
    }

    #[test]
    fn zero_classes_rejected() {
        let err = Targets::classification(&[], 0).unwrap_err();
        assert!(matches!(err, TreeError::ZeroClasses));
    }

    #[test]
    fn non_finite_target_rejected() {
        let err = Targets::regression(&[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, TreeError::NonFiniteTarget { sample_index: 1 }));
    }

    #[test]
    fn mismatched_parts_rejected() {
        let err = Targets::from_parts(vec![1.0, 2.0], vec![0], 1).unwrap_err();
        assert!(matches!(err, TreeError::LengthMismatch { expected: 2, got: 1, .. }));
    }
}
