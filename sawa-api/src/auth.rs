use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use sawa_core::store::{self, Collection};
use sawa_core::{Role, User};
use tracing::info;

use crate::{error::AppError, middleware::issue_token, state::AppState};

#[derive(Debug, Deserialize)]
struct DevTokenRequest {
    email: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    role: Role,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/dev-token", post(dev_token))
}

/// Issues a token for an existing user, with the role their profile grants.
/// Answers 404 unless `auth.allow_dev_tokens` is on, and for unknown emails.
async fn dev_token(
    State(state): State<AppState>,
    Json(req): Json<DevTokenRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if !state.auth.allow_dev_tokens {
        return Err(AppError::NotFoundError("Not found".to_string()));
    }

    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::ValidationError("a valid email is required".to_string()));
    }

    let user: User = store::get_as(state.desk.store().as_ref(), Collection::Users, &email)
        .await?
        .ok_or_else(|| AppError::NotFoundError("no user with that email".to_string()))?;
    let role = user.role();

    let token = issue_token(&state.auth, &email, role)?;
    info!("Issued dev token for {} as {}", sawa_shared::Masked(email.as_str()), role.as_str());

    Ok(Json(AuthResponse { token, role }))
}
