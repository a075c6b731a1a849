use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("cursor is not valid base64: {0}")]
    NotBase64(#[from] base64::DecodeError),

    #[error("cursor bytes are malformed: {0}")]
    Malformed(String),
}
