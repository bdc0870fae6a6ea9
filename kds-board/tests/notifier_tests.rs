//! Notification loop controller tests
//!
//! Run on tokio's paused clock: `time::sleep` advances virtual time
//! deterministically through the countdown and repeat tickers.

mod helpers;

use std::time::Duration;

use helpers::TestBoard;
use kds_board::notifier::NotifierState;
use kds_common::db::settings;
use tokio::time;

async fn sleep_s(seconds: u64, extra_ms: u64) {
    time::sleep(Duration::from_secs(seconds) + Duration::from_millis(extra_ms)).await;
}

#[tokio::test(start_paused = true)]
async fn start_is_idempotent() {
    let t = TestBoard::new().await;

    t.notifier.observe_poll(1, true).await;
    t.notifier.observe_poll(1, false).await;

    // One entry ring only
    assert_eq!(t.sink.ring_count(), 1);
    assert_eq!(t.notifier.state().await, NotifierState::Looping);

    // A single countdown ticker: one decrement per second
    sleep_s(1, 500).await;
    assert_eq!(t.notifier.status().await.countdown_s, 14);

    // A single repeat ticker: exactly one more ring after one period
    sleep_s(14, 0).await;
    assert_eq!(t.sink.ring_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn repeat_ring_cadence() {
    let t = TestBoard::new().await;
    t.notifier.observe_poll(1, true).await;
    assert_eq!(t.sink.ring_count(), 1);

    // Three full periods pass
    sleep_s(45, 500).await;
    assert_eq!(t.sink.ring_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn countdown_decrements_and_resets() {
    let t = TestBoard::new().await;
    t.notifier.observe_poll(1, true).await;
    assert_eq!(t.notifier.status().await.countdown_s, 15);

    sleep_s(3, 500).await;
    assert_eq!(t.notifier.status().await.countdown_s, 12);

    // Past the repeat ring the countdown starts over
    sleep_s(12, 0).await;
    assert_eq!(t.notifier.status().await.countdown_s, 15);
    assert_eq!(t.sink.ring_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn mute_cancels_tickers_and_silences() {
    let t = TestBoard::new().await;
    t.notifier.observe_poll(1, true).await;
    assert_eq!(t.notifier.state().await, NotifierState::Looping);

    t.notifier.mute().await.unwrap();

    let status = t.notifier.status().await;
    assert!(status.muted);
    assert!(!status.looping);
    assert_eq!(status.countdown_s, 15);

    // No ring ever fires while muted
    sleep_s(60, 0).await;
    assert_eq!(t.sink.ring_count(), 1);
    assert_eq!(t.notifier.state().await, NotifierState::Muted);
}

#[tokio::test(start_paused = true)]
async fn muted_poll_with_arrivals_stays_muted() {
    let t = TestBoard::with_sound(false).await;

    t.notifier.observe_poll(2, true).await;

    assert_eq!(t.notifier.state().await, NotifierState::Muted);
    assert_eq!(t.sink.ring_count(), 0);

    // Unmuting while confirmed orders still exist resumes the loop without
    // a re-fetch
    t.notifier.unmute().await.unwrap();
    assert_eq!(t.notifier.state().await, NotifierState::Looping);
    assert_eq!(t.sink.ring_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unmute_without_outstanding_work_goes_idle() {
    let t = TestBoard::with_sound(false).await;

    t.notifier.observe_poll(0, false).await;
    t.notifier.unmute().await.unwrap();

    assert_eq!(t.notifier.state().await, NotifierState::Idle);
    assert_eq!(t.sink.ring_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn arrival_while_looping_rings_again() {
    let t = TestBoard::new().await;
    t.notifier.observe_poll(1, true).await;
    assert_eq!(t.sink.ring_count(), 1);

    // Next poll brings another order mid-loop
    t.notifier.observe_poll(2, true).await;
    assert_eq!(t.sink.ring_count(), 2);
    assert_eq!(t.notifier.state().await, NotifierState::Looping);
}

#[tokio::test(start_paused = true)]
async fn rejected_ring_flags_sound_blocked_until_delivery() {
    let t = TestBoard::new().await;
    t.sink.reject(true);

    t.notifier.observe_poll(1, true).await;

    // Rejection does not change the logical state, only the flag
    let status = t.notifier.status().await;
    assert!(status.sound_blocked);
    assert!(status.looping);
    assert_eq!(t.sink.ring_count(), 0);

    // The next tick retries and clears the flag
    t.sink.reject(false);
    sleep_s(15, 500).await;
    assert_eq!(t.sink.ring_count(), 1);
    assert!(!t.notifier.status().await.sound_blocked);
}

#[tokio::test(start_paused = true)]
async fn sound_preference_survives_restart() {
    let t = TestBoard::new().await;
    t.notifier.mute().await.unwrap();
    assert!(!settings::get_sound_enabled(&t.db).await.unwrap());

    // A fresh controller over the same database starts muted
    let rebuilt = kds_board::notifier::NotificationController::new(
        t.db.clone(),
        t.events.clone(),
        t.sink.clone(),
        helpers::TEST_REPEAT,
    )
    .await
    .unwrap();
    assert_eq!(rebuilt.state().await, NotifierState::Muted);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_tickers() {
    let t = TestBoard::new().await;
    t.notifier.observe_poll(1, true).await;
    assert_eq!(t.sink.ring_count(), 1);

    t.notifier.shutdown().await;

    sleep_s(60, 0).await;
    assert_eq!(t.sink.ring_count(), 1);
}
