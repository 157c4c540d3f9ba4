//! Row-aligned (features, labels) containers for the pool and training set.

use crate::data::FeatureMatrix;
use crate::error::PoolError;

/// A feature matrix with its label vector and the original dataset
/// position of every row.
///
/// `features.nrows() == labels.len() == origin.len()` holds after every
/// constructor and mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSet {
    features: FeatureMatrix,
    labels: Vec<usize>,
    origin: Vec<usize>,
}

impl LabeledSet {
    /// Creates a set whose rows are the original dataset rows `0..n`.
    pub fn new(features: FeatureMatrix, labels: Vec<usize>) -> Result<Self, PoolError> {
        let origin = (0..labels.len()).collect();
        Self::with_origin(features, labels, origin)
    }

    /// Creates a set with explicit original row positions.
    pub fn with_origin(
        features: FeatureMatrix,
        labels: Vec<usize>,
        origin: Vec<usize>,
    ) -> Result<Self, PoolError> {
        if features.nrows() != labels.len() {
            return Err(PoolError::LengthMismatch {
                rows: features.nrows(),
                labels: labels.len(),
            });
        }
        if origin.len() != labels.len() {
            return Err(PoolError::LengthMismatch {
                rows: origin.len(),
                labels: labels.len(),
            });
        }
        Ok(Self {
            features,
            labels,
            origin,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The feature matrix.
    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    /// The labels, aligned with the feature rows.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Original dataset position of each row.
    pub fn origin(&self) -> &[usize] {
        &self.origin
    }

    /// Splits the set into features, labels and origin.
    pub fn into_parts(self) -> (FeatureMatrix, Vec<usize>, Vec<usize>) {
        (self.features, self.labels, self.origin)
    }

    /// Gathers the rows at `indices`, in the order given.
    ///
    /// Indices must be valid and unique positions in the current set.
    pub fn take(&self, indices: &[usize]) -> Result<LabeledSet, PoolError> {
        check_indices(indices, self.len())?;

        Ok(LabeledSet {
            features: self.features.select_rows(indices)?,
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            origin: indices.iter().map(|&i| self.origin[i]).collect(),
        })
    }

    /// Returns a new set without the rows at `indices`.
    ///
    /// Retained rows keep their relative order. The complement is built
    /// from a keep-mask and gathered in one pass, so sparse features stay
    /// sparse. An empty index set yields an equal copy.
    pub fn remove(&self, indices: &[usize]) -> Result<LabeledSet, PoolError> {
        let removed = check_indices(indices, self.len())?;
        let keep: Vec<usize> = (0..self.len()).filter(|&i| !removed[i]).collect();

        Ok(LabeledSet {
            features: self.features.select_rows(&keep)?,
            labels: keep.iter().map(|&i| self.labels[i]).collect(),
            origin: keep.iter().map(|&i| self.origin[i]).collect(),
        })
    }

    /// Appends all rows of `other`.
    pub fn append(&mut self, other: &LabeledSet) -> Result<(), PoolError> {
        self.features = self.features.vstack(&other.features)?;
        self.labels.extend_from_slice(&other.labels);
        self.origin.extend_from_slice(&other.origin);
        Ok(())
    }
}

/// Validates an index set against a container of `len` rows and returns
/// the corresponding mask.
fn check_indices(indices: &[usize], len: usize) -> Result<Vec<bool>, PoolError> {
    let mut mask = vec![false; len];
    for &index in indices {
        if index >= len {
            return Err(PoolError::IndexOutOfRange { index, len });
        }
        if mask[index] {
            return Err(PoolError::DuplicateIndex(index));
        }
        mask[index] = true;
    }
    Ok(mask)
}
