//! Session lifecycle management for authenticated FPL accounts.
//!
//! Owns credentials and session material per account: proactive
//! expiry-driven renewal, reactive re-authentication, encrypted at-rest
//! storage, and failure-based disabling. The request layer obtains session
//! material through the [`fpl_client::SessionProvider`] adapter this crate
//! supplies.

pub mod authenticator;
pub mod config;
pub mod crypto;
pub mod error;
pub mod manager;
pub mod scheduler;
pub mod store;

pub use authenticator::{AuthTokens, CredentialAuthenticator};
pub use config::SessionManagerConfig;
pub use crypto::TokenCipher;
pub use error::SessionManagerError;
pub use manager::{AccountStatus, Credentials, SessionManager};
pub use scheduler::RenewalScheduler;
pub use store::{SessionStore, StoredSession};

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, SessionManagerError>;
