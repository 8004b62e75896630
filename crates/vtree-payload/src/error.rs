use thiserror::Error;
use vtree_types::AttachmentField;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("binary attachment in `{field}` at position {position} belongs to a value without id")]
    UnkeyedAttachment {
        field: AttachmentField,
        position: usize,
    },

    #[error("placeholder key used twice: {0}")]
    DuplicatePartKey(String),

    #[error("attachment {key} too large: {size} bytes (max {max})")]
    AttachmentTooLarge { key: String, size: usize, max: u64 },

    #[error("binary part {0} is not referenced by the update document")]
    DanglingPart(String),

    #[error("multipart boundary occurs inside part {part}")]
    BoundaryCollision { part: String },

    #[error("framing error: {0}")]
    Framing(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PayloadResult<T> = Result<T, PayloadError>;
