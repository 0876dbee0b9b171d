use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use super::{Expirable, RefreshCredential, RefreshablePair};

/// An opaque token value plus the instant it stops being valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    value: String,
    expired_at: Timestamp,
}

impl Token {
    pub fn new(value: impl Into<String>, expired_at: Timestamp) -> Self {
        Self {
            value: value.into(),
            expired_at,
        }
    }

    /// Builds a token that expires `ttl` from now. Saturates instead of
    /// overflowing the representable timestamp range.
    pub fn expiring_in(value: impl Into<String>, ttl: SignedDuration) -> Self {
        let now = Timestamp::now();
        let expired_at = now.checked_add(ttl).unwrap_or(if ttl.is_negative() {
            Timestamp::MIN
        } else {
            Timestamp::MAX
        });
        Self::new(value, expired_at)
    }

    /// The opaque token payload.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Expirable for Token {
    fn expired_at(&self) -> Timestamp {
        self.expired_at
    }
}

impl RefreshCredential for Token {
    fn expiry(&self) -> Option<Timestamp> {
        Some(self.expired_at)
    }
}

/// Access token together with the credential used to renew it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair<T = Token, R = String> {
    pub token: T,
    pub refresh_token: R,
}

impl<T, R> TokenPair<T, R> {
    pub fn new(token: T, refresh_token: R) -> Self {
        Self {
            token,
            refresh_token,
        }
    }
}

impl<T, R> RefreshablePair for TokenPair<T, R>
where
    T: Expirable + Clone + Send + Sync + 'static,
    R: RefreshCredential + Clone + Send + Sync + 'static,
{
    type Token = T;
    type RefreshToken = R;

    fn token(&self) -> &T {
        &self.token
    }

    fn refresh_token(&self) -> &R {
        &self.refresh_token
    }
}
