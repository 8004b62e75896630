//! High-level SDK for saving product variant trees.
//!
//! [`VariantSaver`] runs the whole save pipeline in one call: diff the edited
//! tree against the server snapshot, lift new binary attachments out of the
//! change-set, and assemble the transport payload. A tree with no edits
//! yields [`SaveOutcome::NoChanges`] so callers skip the request entirely.

pub mod error;
pub mod plan;
pub mod saver;

pub use error::{SdkError, SdkResult};
pub use plan::{SaveOutcome, SavePlan};
pub use saver::VariantSaver;

// Re-export key types
pub use vtree_diff::{ChangeSet, ChangeSummary};
pub use vtree_payload::{PayloadConfig, TransportPayload};
pub use vtree_types::{Attachment, DirtyState, EntityId, Feature, FeatureValue, VariantSnapshot};
