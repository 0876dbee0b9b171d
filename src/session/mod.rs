mod epoch;
mod schedule;

use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::errors::{Error, SessionError};
use crate::refresher::Refresher;
use crate::storage::Storage;
use crate::telemetry::refresh::{RefreshOutcome, RefreshTelemetry};
use crate::token::{AutoRefreshPolicy, Expirable, RefreshCredential, RefreshablePair};

use epoch::{Inflight, State, checkpoint, until_cancelled};

/// Refresh credential type carried by the pairs a storage holds.
pub type RefreshTokenOf<S> = <<S as Storage>::Pair as RefreshablePair>::RefreshToken;

/// Error type returned by `Session<S, R>::get`.
pub type SessionErrorOf<S, R> = SessionError<<S as Storage>::Error, <R as Refresher>::Error>;

/// Result of one `get`, as published to every caller of an epoch.
pub type SessionResult<S, R> = Result<<S as Storage>::Pair, SessionErrorOf<S, R>>;

/// Hands out a currently valid token pair, refreshing it through `R` and
/// persisting it through `S` when needed.
///
/// Concurrent `get` calls are coalesced: while an epoch (one
/// restore / validate / refresh / store run) is in flight every caller joins
/// it, so the refresher runs at most once per epoch. Cancelling the caller that
/// started an epoch, by cancelling its token or dropping its future, cancels
/// the epoch for every joined caller.
///
/// Dropping the session cancels the in-flight epoch and aborts any pending
/// auto-refresh. A cancelled epoch stops at its next cancellation point; a
/// `store` already underway finishes, and the epoch still ends as cancelled.
/// Must be used from within a tokio runtime.
pub struct Session<S, R>
where
    S: Storage,
    R: Refresher<Pair = S::Pair, RefreshToken = RefreshTokenOf<S>>,
{
    inner: Arc<Inner<S, R>>,
}

struct Inner<S, R>
where
    S: Storage,
    R: Refresher<Pair = S::Pair, RefreshToken = RefreshTokenOf<S>>,
{
    storage: S,
    refresher: R,
    policy: AutoRefreshPolicy,
    state: Mutex<State<SessionResult<S, R>>>,
}

impl<S, R> Session<S, R>
where
    S: Storage,
    R: Refresher<Pair = S::Pair, RefreshToken = RefreshTokenOf<S>>,
{
    /// Session without proactive refresh.
    pub fn new(storage: S, refresher: R) -> Self {
        Self::with_policy(storage, refresher, AutoRefreshPolicy::disabled())
    }

    /// After every refresh, schedules another one `lead_time` before the new
    /// token expires.
    pub fn with_auto_refresh(storage: S, refresher: R, lead_time: Duration) -> Self {
        Self::with_policy(storage, refresher, AutoRefreshPolicy::new(lead_time))
    }

    /// Session whose auto-refresh lead time comes from `config`.
    pub fn from_config(storage: S, refresher: R, config: &SessionConfig) -> Result<Self, Error> {
        let policy = config.auto_refresh_policy()?;
        Ok(Self::with_policy(storage, refresher, policy))
    }

    /// Session with an explicit auto-refresh policy.
    pub fn with_policy(storage: S, refresher: R, policy: AutoRefreshPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                refresher,
                policy,
                state: Mutex::new(State::new()),
            }),
        }
    }

    /// The storage this session restores from and persists to.
    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    /// The auto-refresh policy in effect.
    pub fn policy(&self) -> AutoRefreshPolicy {
        self.inner.policy
    }

    /// Returns the current pair, refreshing first when the stored token is
    /// expired or `force_refresh` is set.
    pub async fn get(&self, force_refresh: bool) -> SessionResult<S, R> {
        self.inner.get(force_refresh, CancellationToken::new()).await
    }

    /// Like [`Session::get`], but gives up with `SessionError::Cancelled` once
    /// `cancel` fires. If this call started the epoch, the epoch is cancelled
    /// too and every joined caller sees `Cancelled`.
    pub async fn get_cancellable(
        &self,
        force_refresh: bool,
        cancel: CancellationToken,
    ) -> SessionResult<S, R> {
        self.inner.get(force_refresh, cancel).await
    }
}

impl<S, R> Drop for Session<S, R>
where
    S: Storage,
    R: Refresher<Pair = S::Pair, RefreshToken = RefreshTokenOf<S>>,
{
    fn drop(&mut self) {
        self.inner.state.lock().shutdown();
    }
}

impl<S, R> Inner<S, R>
where
    S: Storage,
    R: Refresher<Pair = S::Pair, RefreshToken = RefreshTokenOf<S>>,
{
    async fn get(self: &Arc<Self>, force_refresh: bool, cancel: CancellationToken) -> SessionResult<S, R> {
        let (outcome, owner) = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(SessionError::Cancelled);
            }
            let joined = state.joinable().map(|epoch| {
                epoch.telemetry.emit_joined();
                epoch.outcome.clone()
            });
            match joined {
                Some(outcome) => (outcome, None),
                None => {
                    let (outcome, epoch_cancel) = self.start_epoch(&mut state, force_refresh);
                    (outcome, Some(epoch_cancel.drop_guard()))
                }
            }
        };

        // Returning early drops `owner`, which cancels an epoch this call started.
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            result = epoch::await_outcome(outcome) => result,
        };
        if let Some(owner) = owner {
            owner.disarm();
        }
        result
    }

    fn start_epoch(
        self: &Arc<Self>,
        state: &mut State<SessionResult<S, R>>,
        force_refresh: bool,
    ) -> (watch::Receiver<Option<SessionResult<S, R>>>, CancellationToken) {
        let id = state.next_id();
        let cancel = CancellationToken::new();
        let telemetry = RefreshTelemetry::new(if force_refresh {
            "session.get.forced"
        } else {
            "session.get"
        });
        let (publish, outcome) = watch::channel(None);
        tokio::spawn(Arc::clone(self).run_epoch(
            id,
            force_refresh,
            cancel.clone(),
            telemetry.clone(),
            publish,
        ));
        state.inflight = Some(Inflight {
            id,
            cancel: cancel.clone(),
            outcome: outcome.clone(),
            telemetry,
        });
        (outcome, cancel)
    }

    async fn run_epoch(
        self: Arc<Self>,
        id: u64,
        force_refresh: bool,
        cancel: CancellationToken,
        telemetry: RefreshTelemetry,
        publish: watch::Sender<Option<SessionResult<S, R>>>,
    ) {
        let result = self.execute(force_refresh, &cancel, &telemetry).await;
        match &result {
            Ok(_) => {}
            Err(SessionError::Cancelled) => telemetry.emit_cancelled(),
            Err(err) => telemetry.emit_failure(err),
        }
        // Clear before publishing so a caller woken by the result starts a new epoch.
        self.state.lock().finish(id);
        publish.send_replace(Some(result));
    }

    async fn execute(
        self: &Arc<Self>,
        force_refresh: bool,
        cancel: &CancellationToken,
        telemetry: &RefreshTelemetry,
    ) -> SessionResult<S, R> {
        let restored = until_cancelled(cancel, self.storage.restore())
            .await?
            .map_err(SessionErrorOf::<S, R>::storage)?
            .ok_or(SessionErrorOf::<S, R>::NoStoredData)?;
        checkpoint(cancel)?;

        if !force_refresh && !restored.token().is_expired() {
            telemetry.emit_success(RefreshOutcome::Restored, restored.token().expired_at());
            return Ok(restored);
        }

        if restored.refresh_token().expiry_passed(Timestamp::now()) {
            return Err(SessionError::RefreshExpired);
        }

        telemetry.emit_start(Timestamp::now());
        let refreshed = until_cancelled(cancel, self.refresher.refresh(restored.refresh_token()))
            .await?
            .map_err(SessionErrorOf::<S, R>::refresher)?;
        checkpoint(cancel)?;

        // Never interrupted mid-write; cancellation is observed right after.
        self.storage
            .store(&refreshed)
            .await
            .map_err(SessionErrorOf::<S, R>::storage)?;
        checkpoint(cancel)?;

        let expired_at = refreshed.token().expired_at();
        telemetry.emit_success(RefreshOutcome::Refreshed, expired_at);
        self.schedule_auto_refresh(expired_at, telemetry);
        Ok(refreshed)
    }
}
