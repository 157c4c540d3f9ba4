//! Pool and training set bookkeeping.
//!
//! Both the unlabeled pool and the growing training set are [`LabeledSet`]s.
//! Positional indices into a set are only valid against the snapshot they
//! were computed from: every removal rebuilds a compact set from a
//! keep-mask instead of tracking stable IDs through holes.

pub mod labeled_set;

pub use labeled_set::LabeledSet;
