use axum::Json;
use axum::extract::{Path, State};
use shared::models::{Order, OrderCreate, OrderDetail, OrderStatusUpdate, PaymentStatusUpdate};

use super::{ApiResult, respond};
use crate::service::order;
use crate::state::AppState;

pub async fn place_order(
    State(state): State<AppState>,
    Json(data): Json<OrderCreate>,
) -> ApiResult<OrderDetail> {
    respond(order::place_order(state.store(), data).await)
}

pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Vec<OrderDetail>> {
    respond(order::list_orders(state.store()).await)
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    respond(order::get_order(state.store(), id).await)
}

pub async fn delete_order(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Order> {
    respond(order::delete_order(state.store(), id).await)
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    respond(order::update_order_status(state.store(), id, data).await)
}

pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<PaymentStatusUpdate>,
) -> ApiResult<Order> {
    respond(order::update_payment_status(state.store(), id, data).await)
}

pub async fn list_user_orders(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Vec<OrderDetail>> {
    respond(order::list_user_orders(state.store(), user_id).await)
}
