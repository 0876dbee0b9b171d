use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

use crate::errors::Error;

/// Decides when a freshly refreshed token should be proactively renewed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AutoRefreshPolicy {
    /// How long before expiry the proactive refresh runs. Zero disables it.
    pub lead_time: Duration,
}

impl AutoRefreshPolicy {
    pub fn new(lead_time: Duration) -> Self {
        Self { lead_time }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Builds a policy from a lead time expressed in fractional seconds.
    pub fn from_secs_f64(lead_secs: f64) -> Result<Self, Error> {
        if !lead_secs.is_finite() {
            return Err(Error::Config(format!(
                "Auto-refresh lead time must be finite, got {lead_secs}"
            )));
        }
        if lead_secs < 0.0 {
            return Err(Error::Config(format!(
                "Auto-refresh lead time must be >= 0, got {lead_secs}"
            )));
        }
        Duration::try_from_secs_f64(lead_secs)
            .map(Self::new)
            .map_err(|e| Error::Config(format!("Invalid auto-refresh lead time: {e}")))
    }

    pub fn is_enabled(&self) -> bool {
        !self.lead_time.is_zero()
    }

    /// Delay from `now` until the proactive refresh for a token expiring at
    /// `expired_at`: `(expired_at - now) - lead_time`. `None` when disabled or
    /// when that point has already passed.
    pub fn delay_until_refresh(&self, expired_at: Timestamp, now: Timestamp) -> Option<Duration> {
        if !self.is_enabled() {
            return None;
        }
        let lead = SignedDuration::try_from(self.lead_time).ok()?;
        let delay = expired_at.duration_since(now).checked_sub(lead)?;
        if !delay.is_positive() {
            return None;
        }
        Duration::try_from(delay).ok()
    }
}
