use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use sawa_booking::{AdminSummary, Booking, BookingFilter};
use sawa_core::store::{self, Collection};
use sawa_core::Viewer;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct AdminBookingsResponse {
    #[serde(flatten)]
    pub summary: AdminSummary,
    pub total_revenue: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/admin/bookings", get(list_bookings))
}

/// GET /v1/admin/bookings?status=&city=
async fn list_bookings(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<AdminBookingsResponse>, AppError> {
    if !viewer.can_view_reports() {
        return Err(AppError::AuthorizationError("staff only".to_string()));
    }

    let bookings: Vec<Booking> = store::get_all_as(state.desk.store().as_ref(), Collection::Bookings).await?;
    let summary = AdminSummary::from_bookings(bookings, &filter);
    let total_revenue = summary.total_revenue();

    Ok(Json(AdminBookingsResponse { summary, total_revenue }))
}
