//! Foundation types for variant tree reconciliation.
//!
//! This crate provides the snapshot model shared by every other crate in the
//! workspace: the product variant tree as edited by the dashboard, and the
//! pairing of that tree with the last known server snapshot.
//!
//! # Key Types
//!
//! - [`EntityId`] — Persisted or draft identifier for a feature or value
//! - [`DirtyState`] — Editing tag (`Unchanged`, `Edited`, `New`) set by the UI
//! - [`Feature`] — A variant axis of a product (e.g. "Color")
//! - [`FeatureValue`] — One concrete option under a feature (e.g. "Red")
//! - [`Attachment`] — Existing media reference or newly attached binary
//! - [`VariantSnapshot`] — The `current` vs `initial` pair fed into the engine

pub mod attachment;
pub mod error;
pub mod identity;
pub mod snapshot;
pub mod variant;

pub use attachment::{Attachment, AttachmentField, BinaryAttachment};
pub use error::{TypeError, TypeResult};
pub use identity::EntityId;
pub use snapshot::VariantSnapshot;
pub use variant::{Attributes, DirtyState, Feature, FeatureValue, Tracked};
