use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::EngineError;
use serde_json::json;

/// Maps the engine's error taxonomy onto the HTTP status codes and bodies
/// fixed here. `NotFound` is deliberately 400, not 404 -- the core
/// does not distinguish "doesn't exist" from "not yours".
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            EngineError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors }))).into_response()
            }
            EngineError::Internal(err) => {
                tracing::error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "internal error" })),
                )
                    .into_response()
            }
            other => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Failed to create order", "error": other.reason() })),
            )
                .into_response(),
        }
    }
}
