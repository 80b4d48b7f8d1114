use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use sawa_booking::{CancellationRequest, CancellationStatus, ReasonCategory};
use sawa_core::Viewer;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CancellationBody {
    pub reason_category: ReasonCategory,
    #[serde(default)]
    pub reason_details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    pub approve: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/{id}/cancellations", post(request_cancellation))
        .route("/v1/cancellations/{id}/resolve", post(resolve_cancellation))
}

fn outcome(status: CancellationStatus) -> &'static str {
    match status {
        CancellationStatus::Pending => "requested",
        CancellationStatus::Approved => "approved",
        CancellationStatus::Rejected => "rejected",
    }
}

/// POST /v1/bookings/{id}/cancellations
async fn request_cancellation(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(booking_id): Path<String>,
    Json(body): Json<CancellationBody>,
) -> Result<(StatusCode, Json<CancellationRequest>), AppError> {
    let request = state
        .desk
        .request_cancellation(
            &viewer,
            &booking_id,
            body.reason_category,
            body.reason_details,
            Utc::now().date_naive(),
        )
        .await?;
    state.metrics.cancellations.with_label_values(&[outcome(request.status)]).inc();
    Ok((StatusCode::CREATED, Json(request)))
}

/// POST /v1/cancellations/{id}/resolve
async fn resolve_cancellation(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(request_id): Path<String>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<CancellationRequest>, AppError> {
    let request = state.desk.resolve_cancellation(&viewer, &request_id, body.approve).await?;
    state.metrics.cancellations.with_label_values(&[outcome(request.status)]).inc();
    Ok(Json(request))
}
