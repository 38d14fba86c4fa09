//! Composition root for the FPL automation service.
//!
//! Wires the shared HTTP transport, session manager, API client, renewal
//! scheduler, and transfer executor together from environment
//! configuration.

pub mod config;
pub mod logging;
pub mod service;

pub use config::ServiceConfig;
pub use logging::initialize_logging;
pub use service::FplBotService;
