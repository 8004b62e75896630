//! Transport payload construction for variant change-sets.
//!
//! A [`ChangeSet`](vtree_diff::ChangeSet) may hold raw binary attachments
//! that cannot travel inside the JSON update document. This crate lifts each
//! binary out under a deterministic placeholder key, builds the JSON document
//! that references those keys, and lays everything out as the ordered parts
//! of a `multipart/form-data` request.
//!
//! Pipeline: [`extract_attachments`] → [`assemble`] → [`MultipartCodec::encode`].

pub mod assemble;
pub mod codec;
pub mod config;
pub mod error;
pub mod extract;
pub mod wire;

pub use assemble::{assemble, Part, PartBody, TransportPayload};
pub use codec::MultipartCodec;
pub use config::PayloadConfig;
pub use error::{PayloadError, PayloadResult};
pub use extract::{extract_attachments, placeholder_key, AttachmentPart, Extracted};
pub use wire::{FeatureDto, UpdateDocument, ValueChangesDto, ValueDto, WireChangeSet};
