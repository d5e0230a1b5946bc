use axum::Json;
use axum::extract::{Path, State};
use shared::models::{Cart, CartCreate, CartDetail, CartItem, CartItemCreate, CartItemUpdate};

use super::{ApiResult, respond};
use crate::service::cart;
use crate::state::AppState;

pub async fn create_cart(
    State(state): State<AppState>,
    Json(data): Json<CartCreate>,
) -> ApiResult<Cart> {
    respond(cart::create_cart(state.store(), data).await)
}

pub async fn get_cart(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<CartDetail> {
    respond(cart::get_cart(state.store(), id).await)
}

pub async fn delete_cart(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Cart> {
    respond(cart::delete_cart(state.store(), id).await)
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<i64>,
    Json(data): Json<CartItemCreate>,
) -> ApiResult<CartItem> {
    respond(cart::add_item(state.store(), cart_id, data).await)
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(data): Json<CartItemUpdate>,
) -> ApiResult<CartItem> {
    respond(cart::update_quantity(state.store(), item_id, data).await)
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ApiResult<CartItem> {
    respond(cart::remove_item(state.store(), item_id).await)
}
