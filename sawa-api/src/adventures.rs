use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use sawa_booking::{Booking, NewAdventureBooking};
use sawa_core::Viewer;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/adventures/{id}/bookings", post(book_adventure))
}

/// POST /v1/adventures/{id}/bookings
async fn book_adventure(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(adventure_id): Path<String>,
    Json(req): Json<NewAdventureBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.desk.book_adventure(&viewer, &adventure_id, req).await?;
    state.metrics.bookings_created.with_label_values(&["adventure"]).inc();
    Ok((StatusCode::CREATED, Json(booking)))
}
