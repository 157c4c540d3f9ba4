//! Random initial split of a dataset into a labeled seed set and a pool.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::LearnerError;
use crate::pool::LabeledSet;

use super::matrix::FeatureMatrix;

/// Result of splitting a dataset into a training seed and an unlabeled pool.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSplit {
    /// Initial labeled examples.
    pub train: LabeledSet,
    /// Candidate examples still to be queried.
    pub pool: LabeledSet,
}

impl DatasetSplit {
    /// Returns `(x_train, y_train, x_pool, y_pool)`.
    pub fn into_arrays(self) -> (FeatureMatrix, Vec<usize>, FeatureMatrix, Vec<usize>) {
        let (x_train, y_train, _) = self.train.into_parts();
        let (x_pool, y_pool, _) = self.pool.into_parts();
        (x_train, y_train, x_pool, y_pool)
    }
}

/// Randomly selects `n_initial` rows, without replacement, as the training
/// seed; the remaining rows form the pool.
///
/// Both sides keep the rows in their original relative order. With a seed
/// the split is reproducible; without one it is drawn from OS entropy.
///
/// # Errors
///
/// Returns `LearnerError::InputShape` if `x` and `y` disagree in length,
/// or if `n_initial` is zero or not smaller than the dataset.
pub fn split_pool(
    x: &FeatureMatrix,
    y: &[usize],
    n_initial: usize,
    seed: Option<u64>,
) -> Result<DatasetSplit, LearnerError> {
    let n = y.len();
    if x.nrows() != n {
        return Err(LearnerError::InputShape(format!(
            "feature matrix has {} rows but {} labels were given",
            x.nrows(),
            n
        )));
    }
    if n_initial == 0 || n_initial >= n {
        return Err(LearnerError::InputShape(format!(
            "n_initial must be in 1..{}, got {}",
            n, n_initial
        )));
    }

    let mut rng = create_rng(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let mut train_idx = indices[..n_initial].to_vec();
    let mut pool_idx = indices[n_initial..].to_vec();
    train_idx.sort_unstable();
    pool_idx.sort_unstable();

    debug!(
        train = train_idx.len(),
        pool = pool_idx.len(),
        seeded = seed.is_some(),
        "Split dataset into seed set and pool"
    );

    Ok(DatasetSplit {
        train: gather(x, y, train_idx)?,
        pool: gather(x, y, pool_idx)?,
    })
}

fn gather(x: &FeatureMatrix, y: &[usize], rows: Vec<usize>) -> Result<LabeledSet, LearnerError> {
    let features = x.select_rows(&rows)?;
    let labels = rows.iter().map(|&i| y[i]).collect();
    Ok(LabeledSet::with_origin(features, labels, rows)?)
}

/// Creates a random number generator.
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CsrMatrix;
    use ndarray::Array2;

    fn dataset(n: usize) -> (FeatureMatrix, Vec<usize>) {
        let x = Array2::from_shape_fn((n, 3), |(i, j)| (i + j) as f64);
        let y = (0..n).map(|i| i % 2).collect();
        (FeatureMatrix::Dense(x), y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = dataset(20);
        let split = split_pool(&x, &y, 5, Some(42)).expect("valid split");
        assert_eq!(split.train.len(), 5);
        assert_eq!(split.pool.len(), 15);
    }

    #[test]
    fn test_split_partitions_rows() {
        let (x, y) = dataset(30);
        let split = split_pool(&x, &y, 7, Some(7)).expect("valid split");

        let mut all: Vec<usize> = split
            .train
            .origin()
            .iter()
            .chain(split.pool.origin())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..30).collect::<Vec<_>>());

        for set in [&split.train, &split.pool] {
            assert!(set.origin().windows(2).all(|w| w[0] < w[1]));
            for (pos, &orig) in set.origin().iter().enumerate() {
                assert_eq!(set.labels()[pos], y[orig]);
            }
        }
    }

    #[test]
    fn test_split_reproducible() {
        let (x, y) = dataset(50);
        let first = split_pool(&x, &y, 10, Some(123)).expect("valid split");
        let second = split_pool(&x, &y, 10, Some(123)).expect("valid split");
        assert_eq!(first.train.origin(), second.train.origin());
    }

    #[test]
    fn test_split_different_seeds_differ() {
        let (x, y) = dataset(200);
        let first = split_pool(&x, &y, 20, Some(1)).expect("valid split");
        let second = split_pool(&x, &y, 20, Some(2)).expect("valid split");
        assert_ne!(first.train.origin(), second.train.origin());
    }

    #[test]
    fn test_split_unseeded() {
        let (x, y) = dataset(10);
        let split = split_pool(&x, &y, 3, None).expect("valid split");
        assert_eq!(split.train.len() + split.pool.len(), 10);
    }

    #[test]
    fn test_split_sparse_stays_sparse() {
        let triplets: Vec<(usize, usize, f64)> = (0..12).map(|i| (i, i % 5, 1.0)).collect();
        let x = FeatureMatrix::Sparse(CsrMatrix::from_triplets(12, 5, &triplets).expect("valid"));
        let y: Vec<usize> = (0..12).map(|i| i % 3).collect();

        let split = split_pool(&x, &y, 4, Some(9)).expect("valid split");
        assert!(split.train.features().is_sparse());
        assert!(split.pool.features().is_sparse());
    }

    #[test]
    fn test_split_length_mismatch() {
        let (x, _) = dataset(5);
        let result = split_pool(&x, &[0, 1, 0], 2, Some(0));
        assert!(matches!(result, Err(LearnerError::InputShape(_))));
    }

    #[test]
    fn test_split_n_initial_too_large() {
        let (x, y) = dataset(5);
        assert!(matches!(
            split_pool(&x, &y, 5, Some(0)),
            Err(LearnerError::InputShape(_))
        ));
        assert!(matches!(
            split_pool(&x, &y, 0, Some(0)),
            Err(LearnerError::InputShape(_))
        ));
    }

    #[test]
    fn test_into_arrays() {
        let (x, y) = dataset(8);
        let split = split_pool(&x, &y, 3, Some(5)).expect("valid split");
        let (x_train, y_train, x_pool, y_pool) = split.into_arrays();
        assert_eq!(x_train.nrows(), 3);
        assert_eq!(y_train.len(), 3);
        assert_eq!(x_pool.nrows(), 5);
        assert_eq!(y_pool.len(), 5);
    }
}
