#![allow(dead_code)]

use rust_decimal::Decimal;
use serde_json::json;
use shared::models::{OrderCreate, OrderItemInput, Product, User};
use shop_server::db::MemoryStore;

pub struct Fixture {
    pub store: MemoryStore,
    pub user: User,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let user = store.seed_user("buyer@example.com").await;
        Self { store, user }
    }

    pub async fn product(&self, name: &str, cents: i64, stock: i32) -> Product {
        self.store
            .seed_product(name, Decimal::new(cents, 2), stock)
            .await
    }

    pub async fn stock(&self, product_id: i64) -> i32 {
        self.store.product_stock(product_id).await.unwrap_or(-1)
    }
}

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn line(product_id: i64, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        product_id: Some(product_id),
        quantity: Some(quantity),
        sku: None,
    }
}

pub fn order_for(user_id: i64, items: Vec<OrderItemInput>) -> OrderCreate {
    OrderCreate {
        user_id: Some(user_id),
        email: Some("buyer@example.com".into()),
        payment_method: Some("card".into()),
        items,
        tax_amount: Some(Decimal::ZERO),
        shipping_address: Some(json!({
            "line1": "1 Main St",
            "city": "Springfield",
            "postal_code": "12345",
        })),
        ..Default::default()
    }
}
