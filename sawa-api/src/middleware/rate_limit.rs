use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sawa_store::redis_repo::rate_limit_key;
use tracing::warn;

use crate::state::AppState;

/// Per-IP fixed window backed by Redis. Fails open when Redis is missing,
/// unreachable, or the peer address is unknown.
pub async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (Some(redis), Some(ConnectInfo(addr))) = (
        state.redis.as_ref(),
        req.extensions().get::<ConnectInfo<SocketAddr>>().copied(),
    ) else {
        return next.run(req).await;
    };

    let key = rate_limit_key(&addr.ip().to_string());
    match redis
        .check_rate_limit(&key, state.business_rules.rate_limit_per_minute, 60)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response(),
        Err(e) => {
            warn!("Rate limit check failed, letting request through: {}", e);
            next.run(req).await
        }
    }
}
