use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid product id: {0:?}")]
    InvalidProductId(String),

    #[error("payload error: {0}")]
    Payload(#[from] vtree_payload::PayloadError),
}

pub type SdkResult<T> = Result<T, SdkError>;
