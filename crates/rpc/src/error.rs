//! Wire-level errors for the peer transport, and the machine codes used
//! for surfacing a [`rebac_dispatch::DispatchError`] over HTTP.

use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RpcError>;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("peer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("peer returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("failed to decode peer response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<RpcError> for rebac_dispatch::DispatchError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Remote { message, .. } => rebac_dispatch::DispatchError::PeerUnavailable(message),
            other => rebac_dispatch::DispatchError::PeerUnavailable(other.to_string()),
        }
    }
}

/// The machine code assigned to each [`rebac_dispatch::DispatchError`]
/// variant, and the HTTP status it rides over the wire on.
#[must_use]
pub fn status_and_code(err: &rebac_dispatch::DispatchError) -> (StatusCode, &'static str) {
    use rebac_dispatch::DispatchError::*;
    match err {
        InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        DepthExceeded => (StatusCode::BAD_REQUEST, "DEPTH_EXCEEDED"),
        RevisionStale(_) => (StatusCode::CONFLICT, "REVISION_STALE"),
        PeerUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "PEER_UNAVAILABLE"),
        Canceled => (StatusCode::REQUEST_TIMEOUT, "CANCELED"),
        DeadlineExceeded => (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED"),
        Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    }
}
