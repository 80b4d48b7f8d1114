use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use sawa_booking::{Booking, NewOffer};
use sawa_core::Viewer;
use sawa_offer::Offer;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/{id}/offers", post(submit_offer))
        .route("/v1/bookings/{id}/offers/{offer_id}/accept", post(accept_offer))
        .route("/v1/offers/{id}/decline", post(decline_offer))
}

/// POST /v1/bookings/{id}/offers
async fn submit_offer(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(booking_id): Path<String>,
    Json(req): Json<NewOffer>,
) -> Result<(StatusCode, Json<Offer>), AppError> {
    let offer = state.desk.submit_offer(&viewer, &booking_id, req).await?;
    state.metrics.offers_submitted.inc();
    Ok((StatusCode::CREATED, Json(offer)))
}

/// POST /v1/bookings/{id}/offers/{offer_id}/accept
async fn accept_offer(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path((booking_id, offer_id)): Path<(String, String)>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.desk.accept_offer(&viewer, &booking_id, &offer_id).await?;
    state.metrics.offers_accepted.inc();
    Ok(Json(booking))
}

/// POST /v1/offers/{id}/decline
async fn decline_offer(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(offer_id): Path<String>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(state.desk.decline_offer(&viewer, &offer_id).await?))
}
