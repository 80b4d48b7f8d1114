use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sawa_booking::BookingError;
use sawa_core::StoreError;
use sawa_offer::OfferError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(what) => AppError::NotFoundError(format!("{} not found", what)),
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::Forbidden(msg) => AppError::AuthorizationError(msg),
            BookingError::Conflict(msg) => AppError::ConflictError(msg),
            e @ BookingError::InvalidTransition { .. } => AppError::ConflictError(e.to_string()),
            BookingError::Offer(e @ OfferError::Invalid(_)) => AppError::ValidationError(e.to_string()),
            BookingError::Offer(e @ OfferError::AlreadyProcessed(_)) => AppError::ConflictError(e.to_string()),
            BookingError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            e @ StoreError::NotFound { .. } => AppError::NotFoundError(e.to_string()),
            e @ StoreError::AlreadyExists { .. } => AppError::ConflictError(e.to_string()),
            e => AppError::InternalServerError(e.to_string()),
        }
    }
}
