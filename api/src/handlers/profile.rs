use axum::extract::State;
use axum::{Extension, Json};
use serde_json::json;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::dto::{AssetDto, UserDto};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (user, assets) = state.orders.profile(&auth_user.user_id)?;
    Ok(Json(json!({
        "user": UserDto::from(&user),
        "assets": assets.iter().map(AssetDto::from).collect::<Vec<_>>(),
    })))
}
