//! Verdict and message types emitted by the validator.

use serde::Serialize;

/// Stable message codes. Downstream consumers match on these rather than
/// on message text.
pub mod codes {
    pub const INVALID_TRANSFER: &str = "INVALID_TRANSFER";
    pub const INVALID_SQUAD_SIZE: &str = "INVALID_SQUAD_SIZE";
    pub const INVALID_POSITION_COUNT: &str = "INVALID_POSITION_COUNT";
    pub const CLUB_LIMIT_EXCEEDED: &str = "CLUB_LIMIT_EXCEEDED";
    pub const INSUFFICIENT_BUDGET: &str = "INSUFFICIENT_BUDGET";
    pub const INVALID_FORMATION: &str = "INVALID_FORMATION";
    pub const TRANSFER_LIMIT_EXCEEDED: &str = "TRANSFER_LIMIT_EXCEEDED";
    pub const PLAYER_UNAVAILABLE: &str = "PLAYER_UNAVAILABLE";
    pub const LOW_CHANCE_OF_PLAYING: &str = "LOW_CHANCE_OF_PLAYING";
    pub const OVERRIDE_USED: &str = "OVERRIDE_USED";
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    pub const TRANSFER_EXECUTION_FAILED: &str = "TRANSFER_EXECUTION_FAILED";
}

/// Severity of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Advisory. Does not block execution.
    Warn,
    /// Rule violation. Blocks execution unless overridden.
    Fail,
    /// A step of the pipeline itself broke (auth, upstream submission).
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub code: &'static str,
    pub level: Level,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Outcome of validating one transfer batch.
///
/// `status` is `Fail` whenever a fail- or error-level message is present.
/// `override_required` is the execution gate: it stays set on a failed
/// verdict unless the caller explicitly overrode the failures.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub messages: Vec<Message>,
    pub override_required: bool,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            status: VerdictStatus::Pass,
            messages: Vec::new(),
            override_required: false,
        }
    }

    pub fn push(&mut self, level: Level, code: &'static str, message: impl Into<String>) {
        self.push_with_details(level, code, message, None);
    }

    pub fn push_with_details(
        &mut self,
        level: Level,
        code: &'static str,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        if matches!(level, Level::Fail | Level::Error) {
            self.status = VerdictStatus::Fail;
            self.override_required = true;
        }
        self.messages.push(Message {
            code,
            level,
            message: message.into(),
            details,
        });
    }

    pub fn warn(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Level::Warn, code, message);
    }

    pub fn fail(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Level::Fail, code, message);
    }

    pub fn passed(&self) -> bool {
        self.status == VerdictStatus::Pass
    }

    /// True when execution must not proceed.
    pub fn blocked(&self) -> bool {
        self.override_required
    }

    pub fn failures(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| matches!(m.level, Level::Fail | Level::Error))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.level == Level::Warn)
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.messages.iter().any(|m| m.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_fail_the_verdict() {
        let mut verdict = Verdict::pass();
        verdict.warn(codes::INVALID_FORMATION, "unusual formation");
        assert!(verdict.passed());
        assert!(!verdict.blocked());
        assert_eq!(verdict.warnings().count(), 1);
    }

    #[test]
    fn a_single_failure_flips_status_and_blocks() {
        let mut verdict = Verdict::pass();
        verdict.warn(codes::TRANSFER_LIMIT_EXCEEDED, "hit incoming");
        verdict.fail(codes::INSUFFICIENT_BUDGET, "short by £0.5m");
        assert!(!verdict.passed());
        assert!(verdict.blocked());
        assert_eq!(verdict.failures().count(), 1);
        assert!(verdict.has_code(codes::INSUFFICIENT_BUDGET));
    }
}
