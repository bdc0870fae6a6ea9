//! Notification loop controller
//!
//! Owns the audible-alert lifecycle: while confirmed orders are outstanding
//! and the station is not muted, the alert rings on a fixed cadence with a
//! visible countdown to the next ring. Poll results drive the loop; staff
//! mute/unmute it explicitly.
//!
//! Three logical states: Idle (no alert activity), Looping (repeat ring +
//! countdown tickers armed), Muted (no sound, but outstanding work is still
//! tracked so unmuting can resume the loop without a re-fetch).
//!
//! Ticker discipline: at most one repeat ticker and one countdown ticker
//! exist at any time. Starting the loop while it runs is a no-op; every
//! transition out of Looping aborts both tickers before a new pair can be
//! armed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kds_common::db::settings;
use kds_common::events::{EventBus, KdsEvent};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Countdown granularity
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Nobody was able to play the alert sound
#[derive(Debug, Error)]
#[error("no connected client to play the alert")]
pub struct RingRejected;

/// Where alert rings are delivered
///
/// The board process has no audio device; the production sink forwards
/// rings to connected dashboard clients over the event stream.
pub trait AlertSink: Send + Sync {
    /// Deliver one ring. `next_ring_s` is the cadence, for display.
    fn ring(&self, next_ring_s: u32) -> std::result::Result<(), RingRejected>;
}

/// Production sink: broadcast the ring to connected dashboard clients
pub struct EventAlertSink {
    events: EventBus,
}

impl EventAlertSink {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }
}

impl AlertSink for EventAlertSink {
    fn ring(&self, next_ring_s: u32) -> std::result::Result<(), RingRejected> {
        self.events
            .emit(KdsEvent::AlertRing {
                next_ring_s,
                timestamp: Utc::now(),
            })
            .map(|_| ())
            .map_err(|_| RingRejected)
    }
}

/// Logical notification state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierState {
    Idle,
    Looping,
    Muted,
}

/// Snapshot of the controller for API consumers
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NotificationStatus {
    pub muted: bool,
    pub looping: bool,
    /// Seconds until the next automatic ring (full period while not looping)
    pub countdown_s: u32,
    /// Set when the last ring could not be delivered; cleared on success
    pub sound_blocked: bool,
}

struct Inner {
    muted: bool,
    looping: bool,
    /// Confirmed orders existed in the latest observed poll
    outstanding: bool,
    countdown_s: u32,
    sound_blocked: bool,
    repeat_task: Option<JoinHandle<()>>,
    countdown_task: Option<JoinHandle<()>>,
}

/// Drives the alert loop; constructed once per station session
pub struct NotificationController {
    inner: Arc<Mutex<Inner>>,
    events: EventBus,
    sink: Arc<dyn AlertSink>,
    db: SqlitePool,
    repeat_period: Duration,
}

impl NotificationController {
    /// Create the controller, restoring the persisted sound preference
    pub async fn new(
        db: SqlitePool,
        events: EventBus,
        sink: Arc<dyn AlertSink>,
        repeat_period: Duration,
    ) -> Result<Self> {
        let muted = !settings::get_sound_enabled(&db).await?;
        info!(
            "Notification controller ready (repeat {}s, {})",
            repeat_period.as_secs(),
            if muted { "muted" } else { "sound on" }
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                muted,
                looping: false,
                outstanding: false,
                countdown_s: repeat_period.as_secs() as u32,
                sound_blocked: false,
                repeat_task: None,
                countdown_task: None,
            })),
            events,
            sink,
            db,
            repeat_period,
        })
    }

    fn repeat_secs(&self) -> u32 {
        self.repeat_period.as_secs() as u32
    }

    /// React to a completed poll cycle
    ///
    /// Called by the poller before its result is returned. New arrivals ring
    /// immediately; outstanding confirmed orders keep the loop running; an
    /// empty confirmed set stops it. Muted stations track all of this
    /// without making a sound.
    pub async fn observe_poll(&self, confirmed_count: usize, newly_arrived: bool) {
        let mut inner = self.inner.lock().await;
        let was_looping = inner.looping;

        inner.outstanding = confirmed_count > 0;

        // Extra ring for an arrival while the loop is already running; a
        // fresh loop start below rings on its own
        if newly_arrived && inner.looping {
            ring_now(&mut inner, self.sink.as_ref(), self.repeat_secs());
        }

        if inner.outstanding {
            if !inner.muted {
                self.start_loop_locked(&mut inner);
            }
        } else {
            self.stop_loop_locked(&mut inner);
        }

        if inner.looping != was_looping {
            self.emit_changed_locked(&inner);
        }
    }

    /// Staff suppressed the alert sound
    pub async fn mute(&self) -> Result<()> {
        settings::set_sound_enabled(&self.db, false).await?;

        let mut inner = self.inner.lock().await;
        inner.muted = true;
        self.stop_loop_locked(&mut inner);
        self.emit_changed_locked(&inner);
        info!("Notifications muted");
        Ok(())
    }

    /// Staff re-enabled the alert sound
    ///
    /// Resumes the loop only when the latest poll still shows confirmed
    /// orders; no re-fetch happens here.
    pub async fn unmute(&self) -> Result<()> {
        settings::set_sound_enabled(&self.db, true).await?;

        let mut inner = self.inner.lock().await;
        inner.muted = false;
        if inner.outstanding {
            self.start_loop_locked(&mut inner);
        }
        self.emit_changed_locked(&inner);
        info!("Notifications unmuted");
        Ok(())
    }

    /// Current logical state
    pub async fn state(&self) -> NotifierState {
        let inner = self.inner.lock().await;
        if inner.muted {
            NotifierState::Muted
        } else if inner.looping {
            NotifierState::Looping
        } else {
            NotifierState::Idle
        }
    }

    /// Status snapshot for the API
    pub async fn status(&self) -> NotificationStatus {
        let inner = self.inner.lock().await;
        NotificationStatus {
            muted: inner.muted,
            looping: inner.looping,
            countdown_s: inner.countdown_s,
            sound_blocked: inner.sound_blocked,
        }
    }

    /// Teardown: abort both tickers
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        self.stop_loop_locked(&mut inner);
        debug!("Notification controller shut down");
    }

    /// Arm the ticker pair and ring once; no-op while already looping
    fn start_loop_locked(&self, inner: &mut Inner) {
        if inner.repeat_task.is_some() {
            return;
        }

        inner.looping = true;
        inner.countdown_s = self.repeat_secs();
        ring_now(inner, self.sink.as_ref(), self.repeat_secs());

        let countdown_task = {
            let inner_arc = Arc::clone(&self.inner);
            let repeat_s = self.repeat_secs();
            tokio::spawn(async move {
                let mut tick =
                    time::interval_at(time::Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
                tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tick.tick().await;
                    let mut inner = inner_arc.lock().await;
                    inner.countdown_s = if inner.countdown_s <= 1 {
                        repeat_s
                    } else {
                        inner.countdown_s - 1
                    };
                }
            })
        };

        let repeat_task = {
            let inner_arc = Arc::clone(&self.inner);
            let sink = Arc::clone(&self.sink);
            let period = self.repeat_period;
            let repeat_s = self.repeat_secs();
            tokio::spawn(async move {
                let mut tick = time::interval_at(time::Instant::now() + period, period);
                tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tick.tick().await;
                    let mut inner = inner_arc.lock().await;
                    ring_now(&mut inner, sink.as_ref(), repeat_s);
                    inner.countdown_s = repeat_s;
                }
            })
        };

        inner.countdown_task = Some(countdown_task);
        inner.repeat_task = Some(repeat_task);
        debug!("Alert loop started ({}s cadence)", self.repeat_secs());
    }

    /// Abort both tickers and reset the countdown display
    fn stop_loop_locked(&self, inner: &mut Inner) {
        if let Some(task) = inner.repeat_task.take() {
            task.abort();
        }
        if let Some(task) = inner.countdown_task.take() {
            task.abort();
        }
        if inner.looping {
            debug!("Alert loop stopped");
        }
        inner.looping = false;
        inner.countdown_s = self.repeat_secs();
    }

    fn emit_changed_locked(&self, inner: &Inner) {
        self.events.emit_lossy(KdsEvent::NotificationChanged {
            muted: inner.muted,
            looping: inner.looping,
            countdown_s: inner.countdown_s,
            timestamp: Utc::now(),
        });
    }
}

/// Deliver one ring through the sink, honoring the mute flag.
///
/// A rejected ring flags `sound_blocked` for the UI's "enable sound" prompt
/// and nothing else: the loop keeps running and the next tick retries.
fn ring_now(inner: &mut Inner, sink: &dyn AlertSink, next_ring_s: u32) {
    if inner.muted {
        return;
    }
    match sink.ring(next_ring_s) {
        Ok(()) => {
            inner.sound_blocked = false;
        }
        Err(RingRejected) => {
            if !inner.sound_blocked {
                warn!("Alert ring not delivered; flagging for the dashboard");
            }
            inner.sound_blocked = true;
        }
    }
}
