//! Compressed sparse row (CSR) storage for feature matrices.
//!
//! Row gathering and stacking operate directly on the CSR arrays, so a
//! sparse pool never has to be densified while it shrinks.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::MatrixError;

use super::matrix::RowView;

/// Sparse matrix in compressed sparse row layout.
///
/// Column indices within each row are sorted and unique, and explicit
/// zeros are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCsr")]
pub struct CsrMatrix {
    /// Number of columns.
    ncols: usize,
    /// Offsets into `indices`/`data`; `indptr[i]..indptr[i + 1]` is row `i`.
    indptr: Vec<usize>,
    /// Column index of every stored value.
    indices: Vec<usize>,
    /// Stored non-zero values.
    data: Vec<f64>,
}

/// Unchecked CSR arrays as they appear on the wire.
#[derive(Deserialize)]
struct RawCsr {
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl TryFrom<RawCsr> for CsrMatrix {
    type Error = MatrixError;

    fn try_from(raw: RawCsr) -> Result<Self, Self::Error> {
        Self::from_parts(raw.ncols, raw.indptr, raw.indices, raw.data)
    }
}

impl CsrMatrix {
    /// Builds a matrix from raw CSR arrays, checking every layout invariant.
    ///
    /// # Errors
    ///
    /// Returns `MatrixError::InvalidShape` if `indptr` is empty, does not
    /// start at zero, decreases, or does not end at the number of stored
    /// values, if a row's column indices are not strictly increasing, or
    /// if an explicit zero is stored.
    /// Returns `MatrixError::ColumnOutOfRange` for a column index at or
    /// beyond `ncols`.
    pub fn from_parts(
        ncols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self, MatrixError> {
        if indices.len() != data.len() {
            return Err(MatrixError::InvalidShape(format!(
                "{} column indices but {} values",
                indices.len(),
                data.len()
            )));
        }
        match (indptr.first(), indptr.last()) {
            (Some(&0), Some(&end)) if end == indices.len() => {}
            _ => {
                return Err(MatrixError::InvalidShape(format!(
                    "indptr must run from 0 to {}",
                    indices.len()
                )))
            }
        }

        if indptr.windows(2).any(|bounds| bounds[0] > bounds[1]) {
            return Err(MatrixError::InvalidShape(
                "indptr must be non-decreasing".to_string(),
            ));
        }
        if data.iter().any(|&value| value == 0.0) {
            return Err(MatrixError::InvalidShape(
                "explicit zeros must not be stored".to_string(),
            ));
        }

        for bounds in indptr.windows(2) {
            let row = &indices[bounds[0]..bounds[1]];
            if let Some(&column) = row.iter().find(|&&column| column >= ncols) {
                return Err(MatrixError::ColumnOutOfRange { column, ncols });
            }
            if row.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(MatrixError::InvalidShape(
                    "column indices within a row must be sorted and unique".to_string(),
                ));
            }
        }

        Ok(Self {
            ncols,
            indptr,
            indices,
            data,
        })
    }

    /// Creates an empty matrix with zero rows and `ncols` columns.
    pub fn new(ncols: usize) -> Self {
        Self {
            ncols,
            indptr: vec![0],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Builds a matrix from `(row, column, value)` triplets.
    ///
    /// Duplicate coordinates are summed and the resulting zeros dropped.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, MatrixError> {
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nrows];
        for &(row, column, value) in triplets {
            if row >= nrows {
                return Err(MatrixError::RowOutOfRange { row, nrows });
            }
            rows[row].push((column, value));
        }

        let mut matrix = Self::new(ncols);
        for entries in &rows {
            matrix.push_row(entries)?;
        }
        Ok(matrix)
    }

    /// Converts a dense array, keeping only its non-zero entries.
    pub fn from_dense(dense: ArrayView2<'_, f64>) -> Self {
        let mut matrix = Self::new(dense.ncols());
        for row in dense.rows() {
            for (column, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    matrix.indices.push(column);
                    matrix.data.push(value);
                }
            }
            matrix.indptr.push(matrix.indices.len());
        }
        matrix
    }

    /// Appends one row given as `(column, value)` pairs in any order.
    pub fn push_row(&mut self, entries: &[(usize, f64)]) -> Result<(), MatrixError> {
        let mut sorted = entries.to_vec();
        sorted.sort_by_key(|&(column, _)| column);

        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(sorted.len());
        for (column, value) in sorted {
            if column >= self.ncols {
                return Err(MatrixError::ColumnOutOfRange {
                    column,
                    ncols: self.ncols,
                });
            }
            match merged.last_mut() {
                Some(last) if last.0 == column => last.1 += value,
                _ => merged.push((column, value)),
            }
        }

        for (column, value) in merged {
            if value != 0.0 {
                self.indices.push(column);
                self.data.push(value);
            }
        }
        self.indptr.push(self.indices.len());
        Ok(())
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored non-zero values.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Returns a view of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.nrows()`.
    pub fn row(&self, i: usize) -> RowView<'_> {
        assert!(
            i < self.nrows(),
            "Row index {} out of range for {} rows",
            i,
            self.nrows()
        );
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        RowView::Sparse {
            indices: &self.indices[start..end],
            values: &self.data[start..end],
            ncols: self.ncols,
        }
    }

    /// Gathers the given rows, in the order given, into a new matrix.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self, MatrixError> {
        let nrows = self.nrows();
        let mut selected = Self::new(self.ncols);
        for &row in rows {
            if row >= nrows {
                return Err(MatrixError::RowOutOfRange { row, nrows });
            }
            let (start, end) = (self.indptr[row], self.indptr[row + 1]);
            selected.indices.extend_from_slice(&self.indices[start..end]);
            selected.data.extend_from_slice(&self.data[start..end]);
            selected.indptr.push(selected.indices.len());
        }
        Ok(selected)
    }

    /// Returns a new matrix with the rows of `other` appended below `self`.
    pub fn vstack(&self, other: &CsrMatrix) -> Result<Self, MatrixError> {
        if self.ncols != other.ncols {
            return Err(MatrixError::ColumnMismatch {
                expected: self.ncols,
                found: other.ncols,
            });
        }

        let mut stacked = self.clone();
        let offset = stacked.indices.len();
        stacked.indices.extend_from_slice(&other.indices);
        stacked.data.extend_from_slice(&other.data);
        stacked
            .indptr
            .extend(other.indptr.iter().skip(1).map(|ptr| ptr + offset));
        Ok(stacked)
    }

    /// Expands into a dense array.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.nrows(), self.ncols));
        for i in 0..self.nrows() {
            let (start, end) = (self.indptr[i], self.indptr[i + 1]);
            for k in start..end {
                dense[[i, self.indices[k]]] = self.data[k];
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_matrix() -> CsrMatrix {
        CsrMatrix::from_triplets(
            3,
            4,
            &[(0, 1, 2.0), (0, 3, 1.0), (2, 0, 5.0), (2, 2, -1.0)],
        )
        .expect("valid triplets")
    }

    #[test]
    fn test_from_parts_accepts_valid_layout() {
        let original = sample_matrix();
        let rebuilt = CsrMatrix::from_parts(
            4,
            vec![0, 2, 2, 4],
            vec![1, 3, 0, 2],
            vec![2.0, 1.0, 5.0, -1.0],
        )
        .unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_from_parts_rejects_broken_layout() {
        assert!(matches!(
            CsrMatrix::from_parts(2, vec![], vec![], vec![]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert!(matches!(
            CsrMatrix::from_parts(2, vec![0, 2, 1], vec![0], vec![1.0]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert!(matches!(
            CsrMatrix::from_parts(2, vec![0, 1], vec![0], vec![]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert!(matches!(
            CsrMatrix::from_parts(3, vec![0, 2], vec![2, 1], vec![1.0, 1.0]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert!(matches!(
            CsrMatrix::from_parts(3, vec![0, 2], vec![1, 1], vec![1.0, 1.0]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert!(matches!(
            CsrMatrix::from_parts(2, vec![0, 1], vec![0], vec![0.0]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert_eq!(
            CsrMatrix::from_parts(2, vec![0, 1], vec![7], vec![1.0]),
            Err(MatrixError::ColumnOutOfRange { column: 7, ncols: 2 })
        );
    }

    #[test]
    fn test_deserialize_validates_layout() {
        let matrix = sample_matrix();
        let json = serde_json::to_string(&matrix).unwrap();
        let parsed: CsrMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, matrix);

        let empty_indptr = r#"{"ncols":2,"indptr":[],"indices":[],"data":[]}"#;
        assert!(serde_json::from_str::<CsrMatrix>(empty_indptr).is_err());

        let wide_column = r#"{"ncols":2,"indptr":[0,1],"indices":[7],"data":[1.0]}"#;
        assert!(serde_json::from_str::<CsrMatrix>(wide_column).is_err());
    }

    #[test]
    fn test_new_is_empty() {
        let matrix = CsrMatrix::new(5);
        assert_eq!(matrix.nrows(), 0);
        assert_eq!(matrix.ncols(), 5);
        assert_eq!(matrix.nnz(), 0);
    }

    #[test]
    fn test_from_triplets_shape() {
        let matrix = sample_matrix();
        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.ncols(), 4);
        assert_eq!(matrix.nnz(), 4);
    }

    #[test]
    fn test_from_triplets_sums_duplicates() {
        let matrix =
            CsrMatrix::from_triplets(1, 3, &[(0, 2, 1.5), (0, 2, 2.5), (0, 0, 1.0), (0, 0, -1.0)])
                .expect("valid triplets");
        assert_eq!(matrix.nnz(), 1);
        assert_eq!(matrix.to_dense(), array![[0.0, 0.0, 4.0]]);
    }

    #[test]
    fn test_from_triplets_rejects_bad_row() {
        let result = CsrMatrix::from_triplets(2, 2, &[(2, 0, 1.0)]);
        assert_eq!(result, Err(MatrixError::RowOutOfRange { row: 2, nrows: 2 }));
    }

    #[test]
    fn test_push_row_rejects_bad_column() {
        let mut matrix = CsrMatrix::new(2);
        let result = matrix.push_row(&[(2, 1.0)]);
        assert_eq!(
            result,
            Err(MatrixError::ColumnOutOfRange {
                column: 2,
                ncols: 2
            })
        );
    }

    #[test]
    fn test_dense_roundtrip_keeps_values() {
        let dense = array![[0.0, 1.0, 0.0], [3.0, 0.0, 0.5]];
        let matrix = CsrMatrix::from_dense(dense.view());
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.to_dense(), dense);
    }

    #[test]
    fn test_select_rows_preserves_given_order() {
        let matrix = sample_matrix();
        let selected = matrix.select_rows(&[2, 0]).expect("valid rows");
        assert_eq!(selected.nrows(), 2);
        assert_eq!(
            selected.to_dense(),
            array![[5.0, 0.0, -1.0, 0.0], [0.0, 2.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn test_select_rows_out_of_range() {
        let matrix = sample_matrix();
        assert_eq!(
            matrix.select_rows(&[0, 3]),
            Err(MatrixError::RowOutOfRange { row: 3, nrows: 3 })
        );
    }

    #[test]
    fn test_select_no_rows() {
        let matrix = sample_matrix();
        let selected = matrix.select_rows(&[]).expect("empty selection");
        assert_eq!(selected.nrows(), 0);
        assert_eq!(selected.ncols(), 4);
    }

    #[test]
    fn test_vstack() {
        let top = sample_matrix();
        let bottom = CsrMatrix::from_triplets(1, 4, &[(0, 2, 7.0)]).expect("valid triplets");
        let stacked = top.vstack(&bottom).expect("same width");
        assert_eq!(stacked.nrows(), 4);
        assert_eq!(stacked.nnz(), 5);
        assert_eq!(
            stacked.to_dense().row(3).to_vec(),
            vec![0.0, 0.0, 7.0, 0.0]
        );
    }

    #[test]
    fn test_vstack_column_mismatch() {
        let top = sample_matrix();
        let bottom = CsrMatrix::new(2);
        assert_eq!(
            top.vstack(&bottom),
            Err(MatrixError::ColumnMismatch {
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn test_row_view_is_sparse() {
        let matrix = sample_matrix();
        match matrix.row(0) {
            RowView::Sparse {
                indices, values, ..
            } => {
                assert_eq!(indices, &[1, 3]);
                assert_eq!(values, &[2.0, 1.0]);
            }
            RowView::Dense(_) => panic!("expected a sparse row"),
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_row_out_of_range_panics() {
        let matrix = sample_matrix();
        matrix.row(3);
    }
}
