//! Payload assembly: the update document plus one binary part per attachment.

use std::collections::HashSet;

use tracing::debug;
use vtree_types::BinaryAttachment;

use crate::config::PayloadConfig;
use crate::error::{PayloadError, PayloadResult};
use crate::extract::Extracted;
use crate::wire::{UpdateDocument, ValueDto};

/// Content of a single multipart part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartBody {
    Text(String),
    Binary(BinaryAttachment),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub body: PartBody,
}

impl Part {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: PartBody::Text(text.into()),
        }
    }

    pub fn binary(name: impl Into<String>, attachment: BinaryAttachment) -> Self {
        Self {
            name: name.into(),
            body: PartBody::Binary(attachment),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.body, PartBody::Binary(_))
    }

    pub fn body_bytes(&self) -> &[u8] {
        match &self.body {
            PartBody::Text(text) => text.as_bytes(),
            PartBody::Binary(binary) => binary.data.as_ref(),
        }
    }
}

/// The ordered parts handed to the HTTP client unmodified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportPayload {
    document_field: String,
    parts: Vec<Part>,
}

impl TransportPayload {
    pub fn from_parts(document_field: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            document_field: document_field.into(),
            parts,
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match &self.part(name)?.body {
            PartBody::Text(text) => Some(text),
            PartBody::Binary(_) => None,
        }
    }

    pub fn binary_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().filter(|p| p.is_binary())
    }

    /// The raw JSON update document.
    pub fn document_json(&self) -> Option<&str> {
        self.text(&self.document_field)
    }

    pub fn document(&self) -> PayloadResult<UpdateDocument> {
        let json = self.document_json().ok_or_else(|| {
            PayloadError::Framing(format!("missing document part {}", self.document_field))
        })?;
        serde_json::from_str(json).map_err(|e| PayloadError::Serialization(e.to_string()))
    }

    /// Check that every binary part is referenced exactly once by the update
    /// document, so the receiver can resolve each binary by name.
    pub fn verify_references(&self) -> PayloadResult<()> {
        let document = self.document()?;
        let mut referenced = HashSet::new();
        for key in document.changes.sent_values().flat_map(ValueDto::attachment_refs) {
            if !referenced.insert(key) && self.part(key).is_some() {
                return Err(PayloadError::DuplicatePartKey(key.to_string()));
            }
        }
        match self.binary_parts().find(|p| !referenced.contains(p.name.as_str())) {
            Some(part) => Err(PayloadError::DanglingPart(part.name.clone())),
            None => Ok(()),
        }
    }
}

/// Build the transport payload for `product_id`.
///
/// Parts, in order: the JSON update document, the product id, then one
/// binary part per extracted attachment named by its placeholder key.
pub fn assemble(
    product_id: &str,
    extracted: Extracted,
    config: &PayloadConfig,
) -> PayloadResult<TransportPayload> {
    if let Some(max) = config.attachment_limit() {
        if let Some(part) = extracted.parts.iter().find(|p| p.attachment.len() as u64 > max) {
            return Err(PayloadError::AttachmentTooLarge {
                key: part.key.clone(),
                size: part.attachment.len(),
                max,
            });
        }
    }

    let document = UpdateDocument {
        product_id: product_id.to_string(),
        changes: extracted.change_set,
    };
    let json =
        serde_json::to_string(&document).map_err(|e| PayloadError::Serialization(e.to_string()))?;

    let mut parts = Vec::with_capacity(extracted.parts.len() + 2);
    parts.push(Part::text(&config.document_field, json));
    parts.push(Part::text(&config.product_id_field, product_id));
    parts.extend(
        extracted
            .parts
            .into_iter()
            .map(|p| Part::binary(p.key, p.attachment)),
    );

    debug!(product_id, parts = parts.len(), "payload assembled");
    Ok(TransportPayload::from_parts(&config.document_field, parts))
}
