//! SSE stream of board events
//!
//! Bridges the EventBus to connected dashboard clients. The browser plays
//! the alert audio file when an `alert_ring` event arrives; everything else
//! drives live UI refreshes.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use kds_common::events::EventBus;

/// Create an SSE response subscribed to all future board events
pub fn event_stream(events: &EventBus) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        "New SSE client connected, total clients: {}",
        events.subscriber_count() + 1
    );

    let rx = events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(kds_event) => Event::default()
                .event(kds_event.event_name())
                .json_data(&kds_event)
                .ok()
                .map(Ok),
            Err(e) => {
                // Lagged receiver; skip the gap and continue
                warn!("SSE client error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}
