use std::time::Duration;

use jiff::Timestamp;

/// A value that stops being valid at a fixed point in time.
pub trait Expirable {
    fn expired_at(&self) -> Timestamp;

    /// A value is expired from the instant `expired_at` is reached onward.
    fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expired_at()
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// Returns how long until expiry relative to `now`, or `None` once expired.
    fn remaining(&self, now: Timestamp) -> Option<Duration> {
        Duration::try_from(self.expired_at().duration_since(now))
            .ok()
            .filter(|remaining| !remaining.is_zero())
    }
}

/// The longer-lived credential used to mint a new token.
///
/// Refresh credentials that carry their own expiry report it through
/// `expiry`; the default reports none, meaning the credential is only
/// ever rejected by the refresh backend itself.
pub trait RefreshCredential {
    fn expiry(&self) -> Option<Timestamp> {
        None
    }

    fn expiry_passed(&self, now: Timestamp) -> bool {
        self.expiry().is_some_and(|at| now >= at)
    }
}

impl RefreshCredential for String {}

/// The unit persisted by storage and produced by a refresher.
pub trait RefreshablePair: Clone + Send + Sync + 'static {
    type Token: Expirable + Send + Sync;
    type RefreshToken: RefreshCredential + Send + Sync;

    fn token(&self) -> &Self::Token;
    fn refresh_token(&self) -> &Self::RefreshToken;
}
