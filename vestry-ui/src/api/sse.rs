//! Server-Sent Events (SSE) for live catalog and composer updates
//!
//! Streams every library event as a named SSE event with a JSON payload.
//! The web UI refreshes the grid, composer panel, and outfit list from this
//! stream instead of polling.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use vestry_common::db;

use crate::AppState;

/// GET /events - SSE event stream
///
/// Event names come from `VestryEvent::event_type()`; payloads are the
/// serialized events. Heartbeat comments keep idle connections open.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected");

    let heartbeat_secs = match db::settings::get_sse_heartbeat_secs(&state.db).await {
        Ok(secs) => secs.max(1),
        Err(e) => {
            warn!("Using default SSE heartbeat interval: {}", e);
            15
        }
    };

    // Subscribe to event broadcast
    let mut rx = state.events.subscribe();

    let stream = async_stream::stream! {
        debug!("SSE: event stream started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(heartbeat_secs)) => {
                    debug!("SSE: sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            let event_type = event.event_type();
                            match serde_json::to_string(&event) {
                                Ok(event_json) => {
                                    debug!("SSE: broadcasting event: {}", event_type);
                                    yield Ok(Event::default()
                                        .event(event_type)
                                        .data(event_json));
                                }
                                Err(e) => {
                                    warn!("SSE: failed to serialize event {}: {}", event_type, e);
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("SSE: slow client, {} events skipped", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(heartbeat_secs))
            .text("heartbeat"),
    )
}
