use std::fmt::Display;
use std::time::Duration;

use jiff::Timestamp;
use tracing::{Level, event};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The stored pair was still valid and returned as-is.
    Restored,
    /// The refresher minted a new pair that is now stored.
    Refreshed,
}

/// Structured events for one session epoch.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    epoch_id: Uuid,
    context: String,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            epoch_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn epoch_id(&self) -> Uuid {
        self.epoch_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn emit_start(&self, at: Timestamp) {
        event!(
            Level::INFO,
            epoch_id = %self.epoch_id,
            context = %self.context,
            timestamp = %at,
            "refresh.start"
        );
    }

    pub fn emit_success(&self, outcome: RefreshOutcome, expired_at: Timestamp) {
        match outcome {
            RefreshOutcome::Refreshed => event!(
                Level::INFO,
                epoch_id = %self.epoch_id,
                context = %self.context,
                outcome = ?outcome,
                expired_at = %expired_at,
                "refresh.success"
            ),
            // Fast path; too chatty for INFO.
            RefreshOutcome::Restored => event!(
                Level::DEBUG,
                epoch_id = %self.epoch_id,
                context = %self.context,
                outcome = ?outcome,
                expired_at = %expired_at,
                "refresh.success"
            ),
        }
    }

    pub fn emit_failure(&self, error: &dyn Display) {
        event!(
            Level::ERROR,
            epoch_id = %self.epoch_id,
            context = %self.context,
            error = %error,
            "refresh.failure"
        );
    }

    pub fn emit_cancelled(&self) {
        event!(
            Level::WARN,
            epoch_id = %self.epoch_id,
            context = %self.context,
            "refresh.cancelled"
        );
    }

    pub fn emit_joined(&self) {
        event!(
            Level::DEBUG,
            epoch_id = %self.epoch_id,
            context = %self.context,
            "epoch.joined"
        );
    }

    pub fn emit_scheduled(&self, delay: Duration) {
        event!(
            Level::INFO,
            epoch_id = %self.epoch_id,
            context = %self.context,
            delay_ms = delay.as_millis() as u64,
            "auto_refresh.scheduled"
        );
    }
}
