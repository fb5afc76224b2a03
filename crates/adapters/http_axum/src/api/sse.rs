//! Server-Sent Events (SSE) stream of signal value changes.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::state::AppState;

/// `GET /api/signals/stream`: one `value_changed` event per change.
///
/// The stream continues until the client disconnects or the hub drops its
/// signal bus. A subscriber that falls behind skips the oldest changes.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.hub.signals().subscribe();
    let changes = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(change) => match Event::default().event("value_changed").json_data(&change) {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                tracing::warn!(%err, "failed to encode value change for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, some changes were dropped");
            None
        }
    });

    Sse::new(changes).keep_alive(KeepAlive::default())
}
