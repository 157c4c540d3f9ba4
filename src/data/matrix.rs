//! Feature matrices over dense or sparse storage.
//!
//! `FeatureMatrix` is the candidate matrix of the pool, the training set
//! and the full dataset alike. Row order is the authoritative index space;
//! every gather builds a fresh compact matrix.

use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};

use crate::error::MatrixError;

use super::sparse::CsrMatrix;

/// Norm below which a row is treated as the zero vector.
const ZERO_NORM: f64 = 1e-10;

/// A feature matrix of shape `(n_examples, n_features)`.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureMatrix {
    /// Dense row-major storage.
    Dense(Array2<f64>),
    /// Compressed sparse row storage.
    Sparse(CsrMatrix),
}

impl From<Array2<f64>> for FeatureMatrix {
    fn from(array: Array2<f64>) -> Self {
        FeatureMatrix::Dense(array)
    }
}

impl From<CsrMatrix> for FeatureMatrix {
    fn from(matrix: CsrMatrix) -> Self {
        FeatureMatrix::Sparse(matrix)
    }
}

impl FeatureMatrix {
    /// Number of rows (examples).
    pub fn nrows(&self) -> usize {
        match self {
            FeatureMatrix::Dense(array) => array.nrows(),
            FeatureMatrix::Sparse(matrix) => matrix.nrows(),
        }
    }

    /// Number of columns (features).
    pub fn ncols(&self) -> usize {
        match self {
            FeatureMatrix::Dense(array) => array.ncols(),
            FeatureMatrix::Sparse(matrix) => matrix.ncols(),
        }
    }

    /// Returns true if the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.nrows() == 0
    }

    /// Returns true for sparse storage.
    pub fn is_sparse(&self) -> bool {
        matches!(self, FeatureMatrix::Sparse(_))
    }

    /// Returns a view of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.nrows()`.
    pub fn row(&self, i: usize) -> RowView<'_> {
        match self {
            FeatureMatrix::Dense(array) => RowView::Dense(array.row(i)),
            FeatureMatrix::Sparse(matrix) => matrix.row(i),
        }
    }

    /// Iterates over all rows in order.
    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        (0..self.nrows()).map(move |i| self.row(i))
    }

    /// Gathers the given rows, in the order given, keeping the storage kind.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self, MatrixError> {
        match self {
            FeatureMatrix::Dense(array) => {
                let nrows = array.nrows();
                if let Some(&row) = rows.iter().find(|&&row| row >= nrows) {
                    return Err(MatrixError::RowOutOfRange { row, nrows });
                }
                Ok(FeatureMatrix::Dense(array.select(Axis(0), rows)))
            }
            FeatureMatrix::Sparse(matrix) => Ok(FeatureMatrix::Sparse(matrix.select_rows(rows)?)),
        }
    }

    /// Returns a new matrix with the rows of `other` appended.
    ///
    /// The result keeps the storage kind of `self`; `other` is converted
    /// if it differs.
    pub fn vstack(&self, other: &FeatureMatrix) -> Result<Self, MatrixError> {
        if self.ncols() != other.ncols() {
            return Err(MatrixError::ColumnMismatch {
                expected: self.ncols(),
                found: other.ncols(),
            });
        }

        match (self, other) {
            (FeatureMatrix::Dense(top), FeatureMatrix::Dense(bottom)) => {
                stack_dense(top, bottom).map(FeatureMatrix::Dense)
            }
            (FeatureMatrix::Dense(top), FeatureMatrix::Sparse(bottom)) => {
                stack_dense(top, &bottom.to_dense()).map(FeatureMatrix::Dense)
            }
            (FeatureMatrix::Sparse(top), FeatureMatrix::Sparse(bottom)) => {
                top.vstack(bottom).map(FeatureMatrix::Sparse)
            }
            (FeatureMatrix::Sparse(top), FeatureMatrix::Dense(bottom)) => top
                .vstack(&CsrMatrix::from_dense(bottom.view()))
                .map(FeatureMatrix::Sparse),
        }
    }

    /// Returns a dense copy of the matrix.
    pub fn to_dense(&self) -> Array2<f64> {
        match self {
            FeatureMatrix::Dense(array) => array.clone(),
            FeatureMatrix::Sparse(matrix) => matrix.to_dense(),
        }
    }
}

fn stack_dense(top: &Array2<f64>, bottom: &Array2<f64>) -> Result<Array2<f64>, MatrixError> {
    concatenate(Axis(0), &[top.view(), bottom.view()])
        .map_err(|e| MatrixError::InvalidShape(e.to_string()))
}

/// A borrowed view of one matrix row.
#[derive(Debug, Clone, Copy)]
pub enum RowView<'a> {
    /// A dense row.
    Dense(ArrayView1<'a, f64>),
    /// A sparse row: sorted column indices and their values.
    Sparse {
        indices: &'a [usize],
        values: &'a [f64],
        ncols: usize,
    },
}

impl<'a> RowView<'a> {
    /// Logical length of the row (number of columns).
    pub fn len(&self) -> usize {
        match self {
            RowView::Dense(row) => row.len(),
            RowView::Sparse { ncols, .. } => *ncols,
        }
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dot product with another row.
    ///
    /// # Panics
    ///
    /// Panics if the rows have different lengths.
    pub fn dot(&self, other: &RowView<'_>) -> f64 {
        assert_eq!(
            self.len(),
            other.len(),
            "Rows must have the same length for a dot product"
        );

        match (self, other) {
            (RowView::Dense(a), RowView::Dense(b)) => a.dot(b),
            (RowView::Dense(dense), sparse @ RowView::Sparse { .. }) => sparse.dot_dense(*dense),
            (sparse @ RowView::Sparse { .. }, RowView::Dense(dense)) => sparse.dot_dense(*dense),
            (
                RowView::Sparse {
                    indices: a_idx,
                    values: a_val,
                    ..
                },
                RowView::Sparse {
                    indices: b_idx,
                    values: b_val,
                    ..
                },
            ) => {
                // Merge-join over the sorted column indices.
                let (mut i, mut j) = (0, 0);
                let mut sum = 0.0;
                while i < a_idx.len() && j < b_idx.len() {
                    match a_idx[i].cmp(&b_idx[j]) {
                        std::cmp::Ordering::Less => i += 1,
                        std::cmp::Ordering::Greater => j += 1,
                        std::cmp::Ordering::Equal => {
                            sum += a_val[i] * b_val[j];
                            i += 1;
                            j += 1;
                        }
                    }
                }
                sum
            }
        }
    }

    /// Dot product with a dense vector such as a class centroid.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn dot_dense(&self, dense: ArrayView1<'_, f64>) -> f64 {
        assert_eq!(
            self.len(),
            dense.len(),
            "Rows must have the same length for a dot product"
        );

        match self {
            RowView::Dense(row) => row.dot(&dense),
            RowView::Sparse {
                indices, values, ..
            } => indices
                .iter()
                .zip(values.iter())
                .map(|(&column, value)| value * dense[column])
                .sum(),
        }
    }

    /// Squared L2 norm.
    pub fn norm_squared(&self) -> f64 {
        match self {
            RowView::Dense(row) => row.iter().map(|x| x * x).sum(),
            RowView::Sparse { values, .. } => values.iter().map(|x| x * x).sum(),
        }
    }

    /// L2 norm.
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Cosine similarity in [-1, 1]; 0 when either row is the zero vector.
    pub fn cosine_similarity(&self, other: &RowView<'_>) -> f64 {
        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a < ZERO_NORM || norm_b < ZERO_NORM {
            return 0.0;
        }
        self.dot(other) / (norm_a * norm_b)
    }

    /// Squared Euclidean distance.
    ///
    /// # Panics
    ///
    /// Panics if the rows have different lengths.
    pub fn squared_distance(&self, other: &RowView<'_>) -> f64 {
        assert_eq!(
            self.len(),
            other.len(),
            "Rows must have the same length for a distance"
        );

        match (self, other) {
            (RowView::Dense(a), RowView::Dense(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum(),
            (RowView::Dense(dense), RowView::Sparse { indices, values, .. })
            | (RowView::Sparse { indices, values, .. }, RowView::Dense(dense)) => {
                let mut sum: f64 = dense.iter().map(|x| x * x).sum();
                for (&column, &value) in indices.iter().zip(values.iter()) {
                    let x = dense[column];
                    sum += (x - value).powi(2) - x * x;
                }
                sum.max(0.0)
            }
            (
                RowView::Sparse {
                    indices: a_idx,
                    values: a_val,
                    ..
                },
                RowView::Sparse {
                    indices: b_idx,
                    values: b_val,
                    ..
                },
            ) => {
                let (mut i, mut j) = (0, 0);
                let mut sum = 0.0;
                while i < a_idx.len() || j < b_idx.len() {
                    let a_col = a_idx.get(i).copied().unwrap_or(usize::MAX);
                    let b_col = b_idx.get(j).copied().unwrap_or(usize::MAX);
                    match a_col.cmp(&b_col) {
                        std::cmp::Ordering::Less => {
                            sum += a_val[i] * a_val[i];
                            i += 1;
                        }
                        std::cmp::Ordering::Greater => {
                            sum += b_val[j] * b_val[j];
                            j += 1;
                        }
                        std::cmp::Ordering::Equal => {
                            sum += (a_val[i] - b_val[j]).powi(2);
                            i += 1;
                            j += 1;
                        }
                    }
                }
                sum
            }
        }
    }

    /// Euclidean (L2) distance.
    pub fn euclidean_distance(&self, other: &RowView<'_>) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Adds this row into `target`.
    pub fn add_to(&self, target: &mut Array1<f64>) {
        match self {
            RowView::Dense(row) => *target += row,
            RowView::Sparse {
                indices, values, ..
            } => {
                for (&column, &value) in indices.iter().zip(values.iter()) {
                    target[column] += value;
                }
            }
        }
    }
}
