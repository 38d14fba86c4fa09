//! Resilient request layer for the FPL API.
//!
//! Issues HTTP requests over a shared connection pool, memoises idempotent
//! GET responses in a TTL-bounded cache, classifies outcomes, and retries
//! transient failures with exponential backoff. Authenticated requests pull
//! their cookie/CSRF material from a [`SessionProvider`] supplied by the
//! session manager.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod session;
pub mod transport;

pub use cache::ResponseCache;
pub use client::FplClient;
pub use config::FplClientConfig;
pub use error::FplClientError;
pub use retry::{classify, Outcome, RetryPolicy};
pub use session::{AuthSession, SessionProvider};
pub use transport::{
    HttpTransport, Method, PreparedRequest, RawResponse, ReqwestTransport, TransportError,
};

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, FplClientError>;
