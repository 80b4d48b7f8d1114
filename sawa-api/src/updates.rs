use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::{Stream, StreamExt};
use sawa_core::Viewer;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use crate::{bookings::load_visible, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings/{id}/events", get(booking_events))
}

/// GET /v1/bookings/{id}/events
///
/// Live lifecycle events for one booking. A client that lags behind the
/// broadcast buffer misses events and should refetch the booking.
async fn booking_events(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(booking_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    load_visible(&state, &viewer, &booking_id).await?;

    let rx = state.desk.notifier().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let booking_id = booking_id.clone();
        async move {
            match result {
                Ok(event) if event.booking_id == booking_id => Event::default()
                    .event(event.kind.as_str())
                    .json_data(&event)
                    .ok()
                    .map(Ok),
                Ok(_) => None,
                Err(e) => {
                    warn!("Event stream for booking {} lagged: {}", booking_id, e);
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
