use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use glint_core::identity::{role_allows, Role};
use glint_shared::Masked;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id as a UUID string.
    pub sub: String,
    /// Masked in Debug output; log lines carrying claims must not leak it.
    pub email: Option<Masked<String>>,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn role(&self) -> Result<Role, StatusCode> {
        self.role.parse().map_err(|_| StatusCode::FORBIDDEN)
    }
}

fn decode_claims(state: &AppState, req: &Request) -> Result<Claims, StatusCode> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(token_data.claims)
}

async fn role_gate(
    state: AppState,
    required: &[Role],
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = decode_claims(&state, &req)?;

    if !role_allows(claims.role()?, required) {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    role_gate(state, &[Role::Customer], req, next).await
}

pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    role_gate(state, &[Role::Staff, Role::Manager, Role::Admin], req, next).await
}

pub async fn manager_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    role_gate(state, &[Role::Manager, Role::Admin], req, next).await
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    role_gate(state, &[Role::Admin], req, next).await
}
