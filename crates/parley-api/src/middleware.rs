use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;

use parley_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(ApiError::Unauthorized)?;
    let claims = decode_token(&state.jwt_secret, token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[derive(Debug, Deserialize)]
struct GatewayQuery {
    access_token: Option<String>,
}

/// Same as `require_auth`, but browsers cannot set headers on a WebSocket
/// handshake, so the token may also come from `?access_token=`. Only the
/// gateway route is wrapped with this.
pub async fn require_gateway_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let from_query = Query::<GatewayQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.access_token);

    let claims = match bearer_token(req.headers()) {
        Some(token) => decode_token(&state.jwt_secret, token)?,
        None => {
            let token = from_query.ok_or(ApiError::Unauthorized)?;
            decode_token(&state.jwt_secret, &token)?
        }
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}
