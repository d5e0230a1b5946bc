use axum::Json;
use axum::extract::{Path, State};
use shared::models::{StockLevel, StockUpdate};

use super::{ApiResult, respond};
use crate::service::ledger;
use crate::state::AppState;

pub async fn stock_level(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> ApiResult<StockLevel> {
    respond(ledger::stock_level(state.store(), product_id).await)
}

pub async fn set_stock(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(data): Json<StockUpdate>,
) -> ApiResult<StockLevel> {
    respond(ledger::set_stock(state.store(), product_id, data).await)
}
