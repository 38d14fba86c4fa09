//! Error types for the request layer

use crate::transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FplClientError {
    /// An authenticated request could not obtain a valid session.
    #[error("authentication required: {reason}")]
    AuthRequired { reason: String },

    /// The upstream answered with a non-retryable error status.
    #[error("upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Every retry attempt failed; the upstream should be treated as
    /// unavailable, not as "resource does not exist".
    #[error("upstream unavailable after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Upstream data that parsed but cannot be represented (e.g. an
    /// out-of-range position code).
    #[error("invalid upstream data: {0}")]
    InvalidData(String),

    /// Expected data was absent (e.g. no current gameweek in bootstrap).
    #[error("{0}")]
    MissingData(String),
}
