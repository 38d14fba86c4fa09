//! Rule engine for transfer batches.
//!
//! Pure and deterministic: the validator performs no I/O and never mutates
//! the squad it inspects. Callers assemble a [`ValidationRequest`] from
//! current squad, market, and chip state, and receive a [`Verdict`] whose
//! messages distinguish hard failures from advisory warnings.

pub mod validator;
pub mod verdict;

pub use validator::{TransferValidator, ValidationRequest};
pub use verdict::{codes, Level, Message, Verdict, VerdictStatus};
