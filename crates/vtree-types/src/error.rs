use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("entity id must not be empty")]
    EmptyId,

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type TypeResult<T> = Result<T, TypeError>;
