//! Feature storage and dataset splitting.
//!
//! Examples are rows of a [`FeatureMatrix`], stored either densely
//! (`ndarray::Array2`) or as a compressed sparse row [`CsrMatrix`]. Rows are
//! compared through [`RowView`], which computes dot products, norms and
//! similarities without densifying sparse rows.
//!
//! The initial labeled seed and the unlabeled pool come from
//! [`split_pool`], a seeded random split without replacement.

pub mod matrix;
pub mod sparse;
pub mod split;

pub use matrix::{FeatureMatrix, RowView};
pub use sparse::CsrMatrix;
pub use split::{split_pool, DatasetSplit};
