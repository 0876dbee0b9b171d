#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use token_session::{Expirable, RefreshCredential, Storage, Token, TokenPair, Refresher};

pub type Pair = TokenPair<Token, String>;

pub fn pair_expiring_in(secs: f64) -> Pair {
    TokenPair::new(
        Token::expiring_in("stored", SignedDuration::from_secs_f64(secs)),
        "now".to_string(),
    )
}

pub fn expired_pair() -> Pair {
    TokenPair::new(Token::new("stored", Timestamp::now()), "now".to_string())
}

pub fn expiry(pair: &Pair) -> Timestamp {
    pair.token.expired_at()
}

pub async fn sleep_secs(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestError(pub &'static str);

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test error: {}", self.0)
    }
}

impl std::error::Error for TestError {}

/// Storage whose contents stay observable after the session is dropped.
#[derive(Clone, Default)]
pub struct TestStorage {
    slot: Arc<Mutex<Option<Pair>>>,
    pub restores: Arc<AtomicUsize>,
    pub stores: Arc<AtomicUsize>,
    fail_restore: Option<TestError>,
    store_delay: Duration,
}

impl TestStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: Pair) -> Self {
        let storage = Self::default();
        storage.put(pair);
        storage
    }

    pub fn failing(error: TestError) -> Self {
        Self {
            fail_restore: Some(error),
            ..Self::default()
        }
    }

    /// Each `store` sleeps `secs` before writing; `stores` counts completed writes.
    pub fn with_store_delay(mut self, secs: f64) -> Self {
        self.store_delay = Duration::from_secs_f64(secs);
        self
    }

    pub fn put(&self, pair: Pair) {
        *self.slot.lock().unwrap() = Some(pair);
    }

    pub fn current(&self) -> Option<Pair> {
        self.slot.lock().unwrap().clone()
    }

    pub fn restores(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for TestStorage {
    type Pair = Pair;
    type Error = TestError;

    async fn store(&self, pair: &Pair) -> Result<(), TestError> {
        tokio::time::sleep(self.store_delay).await;
        self.put(pair.clone());
        self.stores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn restore(&self) -> Result<Option<Pair>, TestError> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_restore {
            return Err(err.clone());
        }
        Ok(self.current())
    }
}

/// Sleeps `sleep_before_refresh`, then mints a token valid for `token_duration`.
#[derive(Clone)]
pub struct TestRefresher {
    pub sleep_before_refresh: Duration,
    pub token_duration: Duration,
    pub calls: Arc<AtomicUsize>,
    pub fail_with: Option<TestError>,
}

impl TestRefresher {
    pub fn new(sleep_before_refresh: f64, token_duration: f64) -> Self {
        Self {
            sleep_before_refresh: Duration::from_secs_f64(sleep_before_refresh),
            token_duration: Duration::from_secs_f64(token_duration),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_with: None,
        }
    }

    pub fn failing(error: TestError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(0.0, 1.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Refresher for TestRefresher {
    type RefreshToken = String;
    type Pair = Pair;
    type Error = TestError;

    async fn refresh(&self, refresh_token: &String) -> Result<Pair, TestError> {
        tokio::time::sleep(self.sleep_before_refresh).await;
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let ttl = SignedDuration::try_from(self.token_duration).unwrap();
        Ok(TokenPair::new(
            Token::expiring_in(format!("minted-{n}"), ttl),
            format!("{refresh_token}+"),
        ))
    }
}

/// Refresh credential that carries its own expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiringRefreshToken {
    pub value: String,
    pub expired_at: Timestamp,
}

impl RefreshCredential for ExpiringRefreshToken {
    fn expiry(&self) -> Option<Timestamp> {
        Some(self.expired_at)
    }
}

pub type ExpiringPair = TokenPair<Token, ExpiringRefreshToken>;

/// Refresher for pairs whose refresh credential expires; counts calls only.
#[derive(Clone, Default)]
pub struct ExpiringRefresher {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Refresher for ExpiringRefresher {
    type RefreshToken = ExpiringRefreshToken;
    type Pair = ExpiringPair;
    type Error = TestError;

    async fn refresh(&self, refresh_token: &ExpiringRefreshToken) -> Result<ExpiringPair, TestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TokenPair::new(
            Token::expiring_in("minted", SignedDuration::from_secs(60)),
            refresh_token.clone(),
        ))
    }
}
