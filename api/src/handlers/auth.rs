use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::dto::UserDto;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[allow(dead_code)]
    pub password: String,
}

/// `email` doubles as the user id in this stub -- see `AuthStore` for why
/// credential verification is out of scope for this stub.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, Response> {
    let user = state
        .store
        .get_user(&req.email)
        .map_err(|e| crate::error::ApiError::from(e).into_response())?
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "invalid credentials" })),
            )
                .into_response()
        })?;

    let token = state.auth.issue(&user.id);
    Ok(Json(json!({
        "token": token,
        "user": UserDto::from(&user),
    })))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Json<serde_json::Value> {
    if let Some(token) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        state.auth.revoke(token);
    }
    Json(json!({ "message": "logged out" }))
}
