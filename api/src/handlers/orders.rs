use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::dto::{BookDto, OrderDto};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookQuery {
    pub symbol: String,
}

pub async fn book(
    State(state): State<Arc<AppState>>,
    Extension(_auth_user): Extension<AuthUser>,
    Query(query): Query<BookQuery>,
) -> Result<Json<BookDto>, ApiError> {
    let snapshot = state.orders.book(&query.symbol)?;
    Ok(Json(BookDto::new(&query.symbol, &snapshot)))
}

#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub symbol: String,
    pub side: String,
    pub price: String,
    pub amount: String,
}

pub async fn submit_order(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<SubmitOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let order = state.orders.submit_order(
        &auth_user.user_id,
        &req.symbol,
        &req.side,
        &req.price,
        &req.amount,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "order created", "order": OrderDto::from(&order) })),
    ))
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(order_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state.orders.cancel_order(&auth_user.user_id, &order_id)?;
    Ok(Json(json!({ "message": "order cancelled", "order": OrderDto::from(&order) })))
}
