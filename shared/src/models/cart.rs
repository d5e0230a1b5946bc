//! Cart Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cart entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: i64,
    /// Owner, at most one cart per user
    pub user_id: Option<i64>,
    /// Anonymous session key
    pub session_id: Option<String>,
    pub created_at: i64,
}

/// Cart line
///
/// `price` is the line price (unit price x quantity) captured when the line
/// was last written; it is not re-derived on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create cart payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartCreate {
    pub user_id: Option<i64>,
    pub session_id: Option<String>,
}

/// Add cart item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemCreate {
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub quantity: Option<i32>,
}

/// Update cart item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: Option<i32>,
}

/// Cart with its lines and a computed summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDetail {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartSummary {
    /// Sum of line quantities
    pub item_count: i64,
    /// Sum of line prices
    pub subtotal: Decimal,
}

impl CartSummary {
    pub fn from_items(items: &[CartItem]) -> Self {
        Self {
            item_count: items.iter().map(|i| i64::from(i.quantity)).sum(),
            subtotal: items.iter().map(|i| i.price).sum(),
        }
    }
}
