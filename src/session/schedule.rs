use std::sync::{Arc, Weak};
use std::time::Duration;

use jiff::Timestamp;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::refresher::Refresher;
use crate::storage::Storage;
use crate::telemetry::refresh::RefreshTelemetry;

use super::{Inner, RefreshTokenOf};

/// The single pending proactive refresh owned by a session.
pub(super) struct ScheduledRefresh {
    pub(super) id: u64,
    pub(super) task: JoinHandle<()>,
}

impl<S, R> Inner<S, R>
where
    S: Storage,
    R: Refresher<Pair = S::Pair, RefreshToken = RefreshTokenOf<S>>,
{
    /// Arms a forced refresh `lead_time` ahead of `expired_at`. Replaces any
    /// timer that has not fired yet, so at most one is ever pending.
    pub(super) fn schedule_auto_refresh(
        self: &Arc<Self>,
        expired_at: Timestamp,
        telemetry: &RefreshTelemetry,
    ) {
        let Some(delay) = self
            .policy
            .delay_until_refresh(expired_at, Timestamp::now())
        else {
            return;
        };

        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        let id = state.next_id();
        let task = tokio::spawn(fire_after(Arc::downgrade(self), id, delay));
        if let Some(previous) = state.auto_refresh.replace(ScheduledRefresh { id, task }) {
            previous.task.abort();
        }
        drop(state);

        telemetry.emit_scheduled(delay);
    }

    /// Vacates the timer slot if timer `id` still owns it. Once vacated the
    /// firing refresh is an ordinary caller and a new refresh may re-arm.
    fn take_scheduled(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        match state.auto_refresh.as_ref() {
            Some(scheduled) if scheduled.id == id => {
                state.auto_refresh = None;
                true
            }
            _ => false,
        }
    }
}

async fn fire_after<S, R>(session: Weak<Inner<S, R>>, id: u64, delay: Duration)
where
    S: Storage,
    R: Refresher<Pair = S::Pair, RefreshToken = RefreshTokenOf<S>>,
{
    tokio::time::sleep(delay).await;

    let Some(inner) = session.upgrade() else {
        return;
    };
    if !inner.take_scheduled(id) {
        return;
    }

    debug!(delay_ms = delay.as_millis() as u64, "auto_refresh.fired");
    if let Err(err) = inner.get(true, CancellationToken::new()).await {
        warn!(error = %err, "auto_refresh.failed");
    }
}
