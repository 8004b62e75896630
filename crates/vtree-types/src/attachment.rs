use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Content type used for binary parts that do not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One entry of a value's `icon` or `views` list.
///
/// In JSON a bare string is an existing reference and an object carrying a
/// hex `data` field is a new binary attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attachment {
    /// Already persisted media, usually a URL.
    Reference(String),
    /// Media attached during this editing session, not uploaded yet.
    Binary(BinaryAttachment),
}

impl Attachment {
    pub fn reference(location: impl Into<String>) -> Self {
        Self::Reference(location.into())
    }

    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::Binary(BinaryAttachment::new(data))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(location) => Some(location),
            Self::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryAttachment> {
        match self {
            Self::Binary(binary) => Some(binary),
            Self::Reference(_) => None,
        }
    }
}

/// Raw media bytes with the metadata the multipart part needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryAttachment {
    #[serde(with = "hex_bytes")]
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl BinaryAttachment {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            file_name: None,
            content_type: None,
        }
    }

    /// Attachment from hex-encoded bytes, as carried in snapshot JSON.
    pub fn from_hex(data: &str) -> TypeResult<Self> {
        decode_hex(data).map(Self::new)
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The declared content type, or `application/octet-stream`.
    pub fn effective_content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// The attachment-bearing fields of a value, in extraction order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentField {
    Icon,
    Views,
}

impl AttachmentField {
    pub const ALL: [AttachmentField; 2] = [AttachmentField::Icon, AttachmentField::Views];

    /// Field name as used on the wire and inside placeholder keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icon => "icon",
            Self::Views => "views",
        }
    }
}

impl fmt::Display for AttachmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_hex(data: &str) -> TypeResult<Bytes> {
    hex::decode(data)
        .map(Bytes::from)
        .map_err(|e| TypeError::InvalidHex(e.to_string()))
}

mod hex_bytes {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode_hex(&s).map_err(serde::de::Error::custom)
    }
}
