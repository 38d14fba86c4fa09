//! Transfer execution pipeline: validate, authenticate, submit, audit.

pub mod executor;
pub mod payload;

pub use executor::{ExecutionReport, ExecutionRequest, TransferExecutor};
pub use payload::{TransferLine, TransferPayload};
