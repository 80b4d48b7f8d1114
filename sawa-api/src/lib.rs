use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod adventures;
pub mod auth;
pub mod bookings;
pub mod cancellations;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod offers;
pub mod state;
pub mod updates;
pub mod worker;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    // Everything under /v1 except the token endpoint needs a bearer token
    let protected = Router::new()
        .merge(bookings::routes())
        .merge(offers::routes())
        .merge(adventures::routes())
        .merge(cancellations::routes())
        .merge(admin::routes())
        .merge(updates::routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(metrics::routes())
        .merge(auth::routes())
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit_middleware))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
