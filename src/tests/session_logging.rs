use std::time::Duration;

use crate::session::Session;
use crate::storage::MemoryStorage;

use super::test_support::{
    CountingRefresher, capture_logs, expired_pair, pair_expiring_in, snapshot_logs,
};

fn contains(logs: &[String], needle: &str) -> bool {
    logs.iter().any(|line| line.contains(needle))
}

#[tokio::test(flavor = "current_thread")]
async fn refresh_emits_start_and_success() {
    let (lines, _guard) = capture_logs();
    let refresher = CountingRefresher::new(Duration::from_millis(5), Duration::from_secs(60));
    let session = Session::new(MemoryStorage::with_pair(expired_pair()), refresher.clone());

    session.get(false).await.expect("refresh succeeds");
    assert_eq!(refresher.calls(), 1);

    let logs = snapshot_logs(&lines);
    assert!(contains(&logs, "refresh.start"), "logs: {logs:?}");
    assert!(contains(&logs, "refresh.success"), "logs: {logs:?}");
    assert!(contains(&logs, "Refreshed"), "logs: {logs:?}");
    assert!(!contains(&logs, "auto_refresh.scheduled"), "logs: {logs:?}");
}

#[tokio::test(flavor = "current_thread")]
async fn fast_path_never_logs_refresh_start() {
    let (lines, _guard) = capture_logs();
    let refresher = CountingRefresher::new(Duration::ZERO, Duration::from_secs(60));
    let session = Session::new(
        MemoryStorage::with_pair(pair_expiring_in(Duration::from_secs(60), "seed")),
        refresher.clone(),
    );

    session.get(false).await.expect("restore succeeds");
    assert_eq!(refresher.calls(), 0);

    let logs = snapshot_logs(&lines);
    assert!(!contains(&logs, "refresh.start"), "logs: {logs:?}");
    assert!(contains(&logs, "Restored"), "logs: {logs:?}");
}

#[tokio::test(flavor = "current_thread")]
async fn missing_pair_logs_failure() {
    let (lines, _guard) = capture_logs();
    let session = Session::new(
        MemoryStorage::new(),
        CountingRefresher::new(Duration::ZERO, Duration::from_secs(60)),
    );

    let err = session.get(false).await.expect_err("nothing stored");
    assert!(matches!(err, crate::SessionError::NoStoredData));

    let logs = snapshot_logs(&lines);
    assert!(contains(&logs, "refresh.failure"), "logs: {logs:?}");
    assert!(contains(&logs, "no token pair has been stored"), "logs: {logs:?}");
}

#[tokio::test(flavor = "current_thread")]
async fn auto_refresh_logs_schedule_with_delay() {
    let (lines, _guard) = capture_logs();
    let session = Session::with_auto_refresh(
        MemoryStorage::with_pair(expired_pair()),
        CountingRefresher::new(Duration::ZERO, Duration::from_secs(60)),
        Duration::from_secs(10),
    );

    session.get(false).await.expect("refresh succeeds");

    let logs = snapshot_logs(&lines);
    assert!(contains(&logs, "auto_refresh.scheduled"), "logs: {logs:?}");
    assert!(contains(&logs, "delay_ms="), "logs: {logs:?}");
}

#[tokio::test(flavor = "current_thread")]
async fn joiners_log_epoch_joined() {
    let (lines, _guard) = capture_logs();
    let refresher = CountingRefresher::new(Duration::from_millis(20), Duration::from_secs(60));
    let session = Session::new(MemoryStorage::with_pair(expired_pair()), refresher.clone());

    let (a, b) = tokio::join!(session.get(false), session.get(false));
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(refresher.calls(), 1);

    let logs = snapshot_logs(&lines);
    assert!(contains(&logs, "epoch.joined"), "logs: {logs:?}");
}
