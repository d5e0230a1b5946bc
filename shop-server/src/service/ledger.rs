//! Stock Ledger
//!
//! Single owner of `products.stock`. The transactional primitives
//! (`reserve`, `debit`, `credit`) run inside the caller's transaction and
//! take the product row lock before reading the quantity they act on.

use shared::error::{AppError, ErrorCode};
use shared::models::{Product, StockLevel, StockUpdate};
use shared::util::now_millis;

use crate::db::{Store, StoreTx};
use crate::error::ServiceResult;
use crate::validation::{require, validate_quantity};

pub(crate) fn product_not_found(product_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::ProductNotFound,
        format!("Product {product_id} not found"),
    )
    .with_detail("product_id", product_id)
}

fn insufficient_stock(product_id: i64, requested: i32, available: i32) -> AppError {
    AppError::with_message(
        ErrorCode::InsufficientStock,
        format!("Insufficient stock for product {product_id}: requested {requested}, available {available}"),
    )
    .with_detail("product_id", product_id)
    .with_detail("requested", requested)
    .with_detail("available", available)
}

/// Point-in-time availability check against a product snapshot
pub fn ensure_available(product: &Product, quantity: i32) -> Result<(), AppError> {
    if quantity > product.stock {
        return Err(insufficient_stock(product.id, quantity, product.stock));
    }
    Ok(())
}

async fn locked(tx: &mut dyn StoreTx, product_id: i64) -> ServiceResult<Product> {
    tx.lock_product(product_id)
        .await?
        .ok_or_else(|| product_not_found(product_id).into())
}

/// Lock the product and check that `quantity` units are available. Does not write.
pub async fn reserve(tx: &mut dyn StoreTx, product_id: i64, quantity: i32) -> ServiceResult<Product> {
    validate_quantity(quantity, "quantity")?;
    let product = locked(tx, product_id).await?;
    ensure_available(&product, quantity)?;
    Ok(product)
}

/// Decrement stock by `quantity`, never below zero. Returns the new level.
pub async fn debit(tx: &mut dyn StoreTx, product_id: i64, quantity: i32) -> ServiceResult<i32> {
    let product = reserve(tx, product_id, quantity).await?;
    let stock = product.stock - quantity;
    tx.write_stock(product_id, stock, now_millis()).await?;
    tracing::debug!(product_id, quantity, stock, "Stock debited");
    Ok(stock)
}

/// Increment stock by `quantity`. Returns the new level.
pub async fn credit(tx: &mut dyn StoreTx, product_id: i64, quantity: i32) -> ServiceResult<i32> {
    validate_quantity(quantity, "quantity")?;
    let product = locked(tx, product_id).await?;
    let stock = product.stock.checked_add(quantity).ok_or_else(|| {
        AppError::with_message(ErrorCode::ValueOutOfRange, "Stock level overflow")
            .with_detail("product_id", product_id)
    })?;
    tx.write_stock(product_id, stock, now_millis()).await?;
    tracing::debug!(product_id, quantity, stock, "Stock credited");
    Ok(stock)
}

/// Admin absolute set
pub async fn set_stock(
    store: &dyn Store,
    product_id: i64,
    data: StockUpdate,
) -> ServiceResult<StockLevel> {
    let quantity = require(data.quantity, "quantity")?;
    if quantity < 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "quantity must not be negative",
        )
        .with_detail("field", "quantity")
        .with_detail("value", quantity)
        .into());
    }

    let mut tx = store.begin().await?;
    let product = locked(tx.as_mut(), product_id).await?;
    tx.write_stock(product_id, quantity, now_millis()).await?;
    tx.commit().await?;

    tracing::info!(product_id, from = product.stock, to = quantity, "Stock level set");
    Ok(StockLevel {
        product_id,
        quantity,
    })
}

pub async fn stock_level(store: &dyn Store, product_id: i64) -> ServiceResult<StockLevel> {
    let mut tx = store.begin().await?;
    let product = tx
        .find_product(product_id)
        .await?
        .ok_or_else(|| product_not_found(product_id))?;
    Ok(StockLevel {
        product_id,
        quantity: product.stock,
    })
}
