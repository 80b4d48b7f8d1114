use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use sawa_booking::{Booking, BookingDetails, NewServiceBooking};
use sawa_core::Viewer;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/complete", post(complete_booking))
}

/// POST /v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<NewServiceBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.desk.create_service_booking(&viewer, req).await?;
    state.metrics.bookings_created.with_label_values(&["service"]).inc();
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<Json<BookingDetails>, AppError> {
    let details = load_visible(&state, &viewer, &id).await?;
    Ok(Json(details))
}

/// POST /v1/bookings/{id}/complete
async fn complete_booking(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.desk.complete_booking(&viewer, &id).await?))
}

/// Parties get the full booking. Hosts who bid, and approved hosts while the
/// booking is open for offers, get the bidder view.
pub(crate) async fn load_visible(state: &AppState, viewer: &Viewer, id: &str) -> Result<BookingDetails, AppError> {
    let details = state.desk.details(id).await?;
    if details.visible_to(viewer) {
        return Ok(details);
    }

    let open_to_host = viewer.can_submit_offers() && details.state.is_negotiating();
    if details.has_bidder(viewer) || open_to_host {
        Ok(details.for_bidder(viewer))
    } else {
        Err(AppError::AuthorizationError("not a party to this booking".to_string()))
    }
}
