use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::Claims, state::AppState};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/guest", post(login_guest))
}

/// Development login: issues a short-lived customer token with a fresh id.
async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: None,
        role: "CUSTOMER".to_owned(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token }))
}
