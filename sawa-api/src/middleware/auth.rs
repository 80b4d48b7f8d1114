use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sawa_core::{Role, Viewer};

use crate::{error::AppError, state::{AppState, AuthConfig}};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(auth: &AuthConfig, email: &str, role: Role) -> Result<String, AppError> {
    let claims = Claims {
        sub: email.to_string(),
        role,
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub fn verify_token(auth: &AuthConfig, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &DecodingKey::from_secret(auth.secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::AuthenticationError("Invalid or expired token".to_string()))
}

/// Resolves the bearer token into a `Viewer` request extension
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let claims = verify_token(&state.auth, bearer.token())?;
    req.extensions_mut().insert(Viewer::new(claims.sub, claims.role));

    Ok(next.run(req).await)
}
