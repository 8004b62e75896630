//! Tree differencer for product variant trees.
//!
//! Compares a locally edited variant tree against the last known server
//! snapshot and produces the minimal set of create/update/delete operations
//! at the feature and value levels.
//!
//! # Key Types
//!
//! - [`ChangeSet`] -- Feature-level operations plus value operations per feature
//! - [`ValueChanges`] -- Value operations for one existing feature
//! - [`ChangeSummary`] -- Per-kind operation counts

pub mod change_set;
mod matching;
pub mod tree_diff;
pub mod value_diff;

pub use change_set::{ChangeSet, ChangeSummary, ValueChanges};
pub use tree_diff::{diff_features, diff_snapshot};
pub use value_diff::diff_values;
