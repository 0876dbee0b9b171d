use async_trait::async_trait;

/// Exchanges a refresh credential for a brand new token pair, typically by
/// calling an authorization server. Retries and backoff belong here, not in
/// the session.
#[async_trait]
pub trait Refresher: Send + Sync + 'static {
    type RefreshToken: Send + Sync;
    type Pair;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn refresh(&self, refresh_token: &Self::RefreshToken) -> Result<Self::Pair, Self::Error>;
}
