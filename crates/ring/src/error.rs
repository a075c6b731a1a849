use thiserror::Error;

pub type Result<T> = std::result::Result<T, RingError>;

#[derive(Debug, Error)]
pub enum RingError {
    #[error("no peers are registered on the ring")]
    Empty,
}
