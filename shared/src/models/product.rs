//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
///
/// `stock` is the available quantity. Only the stock ledger writes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Unit price in currency unit
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub updated_at: i64,
}

/// Stock level snapshot returned by the ledger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockLevel {
    pub product_id: i64,
    pub quantity: i32,
}

/// Admin stock set payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUpdate {
    pub quantity: Option<i32>,
}
