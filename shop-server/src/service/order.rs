//! Order Placer
//!
//! `place_order` is one transaction: lock every referenced product (ascending
//! id), check all quantities, write header + items, debit the ledger. Any
//! failure drops the transaction, so an order is never partially created.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Order, OrderCreate, OrderDetail, OrderItem, OrderStatus, OrderStatusUpdate, PaymentStatus,
    PaymentStatusUpdate, Product,
};
use shared::util::{line_total, now_millis, round_money, snowflake_id};

use super::ledger;
use crate::db::{Store, StoreTx};
use crate::error::ServiceResult;
use crate::validation::{
    MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, ensure_storable, require, validate_amount, validate_email,
    validate_optional_text, validate_quantity, validate_required_text,
};

/// One requested line after validation
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i32,
    pub sku: Option<String>,
}

/// A place-order request that passed every check not needing the store
#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    pub user_id: i64,
    pub email: String,
    pub payment_method: String,
    pub lines: Vec<OrderLine>,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub discount_amount: Decimal,
    pub billing_address: Option<Value>,
    pub shipping_address: Value,
    pub notes: Option<String>,
}

/// Order amounts, all rounded to 2 decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// `total = subtotal + tax + shipping - discount`, subtotal being the sum of
/// the already rounded line totals. Every amount must stay storable.
pub fn compute_totals(
    line_totals: impl IntoIterator<Item = Decimal>,
    tax: Decimal,
    shipping: Decimal,
    discount: Decimal,
) -> Result<Totals, AppError> {
    let subtotal = line_totals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t))
        .ok_or_else(|| totals_overflow("subtotal"))?;
    let subtotal = ensure_storable(round_money(subtotal), "subtotal")?;
    let tax = ensure_storable(round_money(tax), "tax_amount")?;
    let shipping = ensure_storable(round_money(shipping), "shipping_amount")?;
    let discount = ensure_storable(round_money(discount), "discount_amount")?;

    let total = subtotal
        .checked_add(tax)
        .and_then(|t| t.checked_add(shipping))
        .and_then(|t| t.checked_sub(discount))
        .ok_or_else(|| totals_overflow("total_amount"))?;
    let total = ensure_storable(total, "total_amount")?;

    Ok(Totals {
        subtotal,
        tax,
        shipping,
        discount,
        total,
    })
}

fn totals_overflow(field: &str) -> AppError {
    AppError::with_message(ErrorCode::ValueOutOfRange, format!("{field} overflows"))
        .with_detail("field", field)
}

/// Validate a place-order payload before any I/O
pub fn validate(data: OrderCreate) -> Result<ValidatedOrder, AppError> {
    let user_id = require(data.user_id, "user_id")?;

    let email = require(data.email, "email")?;
    validate_email(&email)?;

    let payment_method = require(data.payment_method, "payment_method")?;
    validate_required_text(&payment_method, "payment_method", MAX_SHORT_TEXT_LEN)?;

    let tax_amount = require(data.tax_amount, "tax_amount")?;
    let shipping_amount = data.shipping_amount.unwrap_or(Decimal::ZERO);
    let discount_amount = data.discount_amount.unwrap_or(Decimal::ZERO);
    validate_amount(tax_amount, "tax_amount")?;
    validate_amount(shipping_amount, "shipping_amount")?;
    validate_amount(discount_amount, "discount_amount")?;

    let shipping_address = match data.shipping_address {
        Some(Value::Null) | None => return Err(AppError::required("shipping_address")),
        Some(addr) => addr,
    };
    let billing_address = data.billing_address.filter(|v| !v.is_null());
    validate_optional_text(&data.notes, "notes", MAX_NOTE_LEN)?;

    if data.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    let mut seen = HashSet::with_capacity(data.items.len());
    let mut lines = Vec::with_capacity(data.items.len());
    for (idx, item) in data.items.into_iter().enumerate() {
        let product_id = require(item.product_id, &format!("items[{idx}].product_id"))?;
        let quantity = require(item.quantity, &format!("items[{idx}].quantity"))?;
        validate_quantity(quantity, &format!("items[{idx}].quantity"))?;
        validate_optional_text(&item.sku, &format!("items[{idx}].sku"), MAX_SHORT_TEXT_LEN)?;
        if !seen.insert(product_id) {
            return Err(AppError::invalid_request(format!(
                "Product {product_id} appears more than once, merge the lines"
            ))
            .with_detail("product_id", product_id));
        }
        lines.push(OrderLine {
            product_id,
            quantity,
            sku: item.sku,
        });
    }

    Ok(ValidatedOrder {
        user_id,
        email: email.trim().to_string(),
        payment_method,
        lines,
        tax_amount,
        shipping_amount,
        discount_amount,
        billing_address,
        shipping_address,
        notes: data.notes,
    })
}

fn order_not_found(order_id: i64) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {order_id} not found"))
        .with_detail("order_id", order_id)
}

fn user_not_found(user_id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {user_id} not found"))
        .with_detail("user_id", user_id)
}

fn order_number(order_id: i64, now: i64) -> String {
    format!("ORD-{now}-{:04}", order_id.rem_euclid(10_000))
}

/// Every line whose quantity exceeds the locked stock level
fn shortfalls(lines: &[OrderLine], products: &HashMap<i64, Product>) -> Vec<Value> {
    lines
        .iter()
        .filter_map(|line| {
            let product = products.get(&line.product_id)?;
            (line.quantity > product.stock).then(|| {
                json!({
                    "product_id": line.product_id,
                    "requested": line.quantity,
                    "available": product.stock,
                })
            })
        })
        .collect()
}

pub async fn place_order(store: &dyn Store, data: OrderCreate) -> ServiceResult<OrderDetail> {
    let req = validate(data)?;

    let mut tx = store.begin().await?;

    if tx.find_user(req.user_id).await?.is_none() {
        return Err(user_not_found(req.user_id).into());
    }

    let mut ids: Vec<i64> = req.lines.iter().map(|l| l.product_id).collect();
    ids.sort_unstable();
    let products: HashMap<i64, Product> = tx
        .lock_products(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    if products.len() != ids.len() {
        let missing: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !products.contains_key(id))
            .collect();
        return Err(AppError::with_message(
            ErrorCode::ProductNotFound,
            "One or more products were not found",
        )
        .with_detail("missing_product_ids", missing)
        .into());
    }

    let short = shortfalls(&req.lines, &products);
    if !short.is_empty() {
        tracing::warn!(user_id = req.user_id, count = short.len(), "Order rejected: out of stock");
        return Err(AppError::with_message(
            ErrorCode::ProductOutOfStock,
            "One or more products do not have enough stock",
        )
        .with_detail("items", Value::Array(short))
        .into());
    }

    let order_id = snowflake_id();
    let now = now_millis();
    let mut items = Vec::with_capacity(req.lines.len());
    for line in &req.lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| ledger::product_not_found(line.product_id))?;
        let price = round_money(product.price);
        items.push(OrderItem {
            id: snowflake_id(),
            order_id,
            product_id: product.id,
            product_name: product.name.clone(),
            sku: line.sku.clone(),
            quantity: line.quantity,
            price,
            total: line_total(price, line.quantity),
        });
    }

    let totals = compute_totals(
        items.iter().map(|i| i.total),
        req.tax_amount,
        req.shipping_amount,
        req.discount_amount,
    )?;
    if totals.total < Decimal::ZERO {
        return Err(AppError::new(ErrorCode::OrderNegativeTotal)
            .with_detail("total_amount", totals.total.to_string())
            .into());
    }

    let order = Order {
        id: order_id,
        order_number: order_number(order_id, now),
        user_id: req.user_id,
        email: req.email,
        payment_method: req.payment_method,
        subtotal: totals.subtotal,
        tax_amount: totals.tax,
        shipping_amount: totals.shipping,
        discount_amount: totals.discount,
        total_amount: totals.total,
        billing_address: req.billing_address,
        shipping_address: req.shipping_address,
        notes: req.notes,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    tx.insert_order(&order).await?;
    tx.insert_order_items(&items).await?;
    for item in &items {
        ledger::debit(tx.as_mut(), item.product_id, item.quantity).await?;
    }
    tx.commit().await?;

    tracing::info!(
        order_id,
        order_number = %order.order_number,
        user_id = order.user_id,
        items = items.len(),
        total = %order.total_amount,
        "Order placed"
    );
    Ok(OrderDetail { order, items })
}

async fn load_detail(tx: &mut dyn StoreTx, order: Order) -> ServiceResult<OrderDetail> {
    let items = tx.order_items(order.id).await?;
    Ok(OrderDetail { order, items })
}

pub async fn get_order(store: &dyn Store, order_id: i64) -> ServiceResult<OrderDetail> {
    let mut tx = store.begin().await?;
    let order = tx
        .find_order(order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    load_detail(tx.as_mut(), order).await
}

/// Every order with its lines, newest first
pub async fn list_orders(store: &dyn Store) -> ServiceResult<Vec<OrderDetail>> {
    let mut tx = store.begin().await?;
    let orders = tx.all_orders().await?;
    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        details.push(load_detail(tx.as_mut(), order).await?);
    }
    Ok(details)
}

/// Newest first
pub async fn list_user_orders(store: &dyn Store, user_id: i64) -> ServiceResult<Vec<OrderDetail>> {
    let mut tx = store.begin().await?;
    if tx.find_user(user_id).await?.is_none() {
        return Err(user_not_found(user_id).into());
    }
    let orders = tx.orders_by_user(user_id).await?;
    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        details.push(load_detail(tx.as_mut(), order).await?);
    }
    Ok(details)
}

/// Delete an order and its items. Orders that never shipped return their
/// units to stock in the same transaction.
pub async fn delete_order(store: &dyn Store, order_id: i64) -> ServiceResult<Order> {
    let mut tx = store.begin().await?;

    let order = tx
        .lock_order(order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    let mut items = tx.order_items(order_id).await?;
    tx.delete_order(order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;

    let restock = order.status.is_restockable();
    if restock {
        items.sort_by_key(|i| i.product_id);
        for item in &items {
            ledger::credit(tx.as_mut(), item.product_id, item.quantity).await?;
        }
    }
    tx.commit().await?;

    tracing::info!(order_id, status = %order.status, restock, items = items.len(), "Order deleted");
    Ok(order)
}

pub async fn update_order_status(
    store: &dyn Store,
    order_id: i64,
    data: OrderStatusUpdate,
) -> ServiceResult<Order> {
    let mut tx = store.begin().await?;
    let order = tx
        .update_order_status(order_id, data.status, now_millis())
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    tx.commit().await?;

    tracing::info!(order_id, status = %order.status, "Order status updated");
    Ok(order)
}

pub async fn update_payment_status(
    store: &dyn Store,
    order_id: i64,
    data: PaymentStatusUpdate,
) -> ServiceResult<Order> {
    let mut tx = store.begin().await?;
    let order = tx
        .update_payment_status(order_id, data.status, now_millis())
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    tx.commit().await?;

    tracing::info!(order_id, payment_status = %order.payment_status, "Payment status updated");
    Ok(order)
}
