use std::future::Future;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::errors::SessionError;
use crate::telemetry::refresh::RefreshTelemetry;

use super::schedule::ScheduledRefresh;

/// Handle table guarded by the session mutex. Only ever touched synchronously.
pub(super) struct State<T> {
    pub(super) closed: bool,
    pub(super) inflight: Option<Inflight<T>>,
    pub(super) auto_refresh: Option<ScheduledRefresh>,
    next_id: u64,
}

impl<T> State<T> {
    pub(super) fn new() -> Self {
        Self {
            closed: false,
            inflight: None,
            auto_refresh: None,
            next_id: 0,
        }
    }

    pub(super) fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// The in-flight epoch a new caller may join. A cancelled epoch that has
    /// not cleared itself yet is not joinable.
    pub(super) fn joinable(&self) -> Option<&Inflight<T>> {
        self.inflight
            .as_ref()
            .filter(|epoch| !epoch.cancel.is_cancelled())
    }

    /// Clears the handle if it still belongs to epoch `id`; a newer epoch may
    /// already have replaced a cancelled one.
    pub(super) fn finish(&mut self, id: u64) {
        if self.inflight.as_ref().is_some_and(|epoch| epoch.id == id) {
            self.inflight = None;
        }
    }

    pub(super) fn shutdown(&mut self) {
        self.closed = true;
        // Cancel only: the epoch unwinds at its next cancellation point, and a
        // `store` already underway runs to completion instead of being torn.
        if let Some(epoch) = self.inflight.take() {
            epoch.cancel.cancel();
        }
        if let Some(scheduled) = self.auto_refresh.take() {
            scheduled.task.abort();
        }
    }
}

/// One running epoch: the joinable result channel plus the token that
/// cancels it.
pub(super) struct Inflight<T> {
    pub(super) id: u64,
    pub(super) cancel: CancellationToken,
    pub(super) outcome: watch::Receiver<Option<T>>,
    pub(super) telemetry: RefreshTelemetry,
}

/// Marker raised at a cancellation point inside an epoch.
#[derive(Debug, Clone, Copy)]
pub(super) struct Cancelled;

impl<SE, RE> From<Cancelled> for SessionError<SE, RE> {
    fn from(_: Cancelled) -> Self {
        SessionError::Cancelled
    }
}

pub(super) fn checkpoint(cancel: &CancellationToken) -> Result<(), Cancelled> {
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }
    Ok(())
}

/// Drives `fut` unless the epoch is cancelled first, in which case `fut` is
/// dropped where it stands.
pub(super) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, Cancelled> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        output = fut => Ok(output),
    }
}

/// Waits for an epoch to publish. An epoch torn down before publishing
/// (task panicked or runtime shut down) reads as cancelled.
pub(super) async fn await_outcome<P, SE, RE>(
    mut outcome: watch::Receiver<Option<Result<P, SessionError<SE, RE>>>>,
) -> Result<P, SessionError<SE, RE>>
where
    P: Clone,
{
    match outcome.wait_for(Option::is_some).await {
        Ok(published) => published.clone().unwrap_or(Err(SessionError::Cancelled)),
        Err(_) => Err(SessionError::Cancelled),
    }
}
