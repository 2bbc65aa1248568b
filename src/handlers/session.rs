//! Session HTTP handlers.
//!
//! This module exposes the calling session's state:
//! - GET /api/v1/session - Current account and history snapshot
//! - GET /api/v1/session/events - Server-sent event stream of changes

use crate::middleware::auth::CurrentSession;
use crate::session::{SessionEvent, SessionSnapshot};
use axum::{
    Extension, Json,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};

/// Current session snapshot.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "account": { "id": "...", "balance": 500000, ... },
///   "transactions": [ ... newest first ... ]
/// }
/// ```
pub async fn snapshot(Extension(current): Extension<CurrentSession>) -> Json<SessionSnapshot> {
    Json(current.session.snapshot().await)
}

/// Server-sent events for the calling session.
///
/// Subscribes to the session and streams its events:
/// - `snapshot` with the full state, immediately on connect and after
///   every observed change
/// - `signed_out` once when the session closes, after which the stream
///   ends
///
/// Disconnecting simply drops the subscription; the session prunes it on
/// the next send.
pub async fn events(
    Extension(current): Extension<CurrentSession>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let watcher = current.session.subscribe().await;

    let stream = stream::unfold(Some(watcher), |slot| async move {
        let mut watcher = slot?;
        let (event, next) = match watcher.recv().await? {
            SessionEvent::Snapshot(snapshot) => (
                Event::default().event("snapshot").json_data(&snapshot),
                Some(watcher),
            ),
            // Terminal: yield the notice, then end the stream.
            SessionEvent::SignedOut => {
                (Ok(Event::default().event("signed_out").data("{}")), None)
            }
        };
        Some((event, next))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
