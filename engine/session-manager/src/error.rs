//! Error types for the session manager

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionManagerError {
    /// Neither a token pair nor a username/password pair is configured.
    /// Terminal; never retried.
    #[error("no usable credentials for account {account_id}")]
    NoCredentials { account_id: String },

    /// Too many consecutive renewal failures; operator intervention needed.
    #[error("account {account_id} disabled after {failures} consecutive auth failures")]
    AccountDisabled { account_id: String, failures: u32 },

    #[error("account {account_id} is not registered")]
    UnknownAccount { account_id: String },

    #[error("authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("token encryption error: {0}")]
    Crypto(String),

    #[error("session store i/o error: {0}")]
    Store(#[from] std::io::Error),

    #[error("session store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
