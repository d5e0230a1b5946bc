//! PostgreSQL backend
//!
//! Check-then-act sequences rely on row locks: product rows are locked with
//! `FOR UPDATE` in ascending id order before any stock decision, review rows
//! before any vote transition. Isolation level stays READ COMMITTED.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Cart, CartItem, Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductReview,
    ReviewVote, User,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use super::{Store, StoreError, StoreResult, StoreTx, UniqueKey, VoteCounts};

/// SQLSTATE codes mapped to [`StoreError`] variants
const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Map a driver error onto the store error taxonomy
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => return StoreError::Conflict,
            Some(UNIQUE_VIOLATION) => {
                let key = match db_err.constraint() {
                    Some("cart_items_line_key") => UniqueKey::CartLine,
                    Some("carts_user_id_key") => UniqueKey::CartOwner,
                    Some("product_reviews_product_id_user_id_key") => UniqueKey::ReviewAuthor,
                    Some("review_votes_pkey") => UniqueKey::ReviewVote,
                    _ => UniqueKey::Other,
                };
                return StoreError::UniqueViolation(key);
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// PostgreSQL-backed [`Store`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, then bring the schema up to date
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await.map_err(classify)?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

// ── Row types ──

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    user_id: i64,
    email: String,
    payment_method: String,
    subtotal: Decimal,
    tax_amount: Decimal,
    shipping_amount: Decimal,
    discount_amount: Decimal,
    total_amount: Decimal,
    billing_address: Option<serde_json::Value>,
    shipping_address: serde_json::Value,
    notes: Option<String>,
    status: String,
    payment_status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(StoreError::Corrupted)?;
        let payment_status: PaymentStatus =
            row.payment_status.parse().map_err(StoreError::Corrupted)?;
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            email: row.email,
            payment_method: row.payment_method,
            subtotal: row.subtotal,
            tax_amount: row.tax_amount,
            shipping_amount: row.shipping_amount,
            discount_amount: row.discount_amount,
            total_amount: row.total_amount,
            billing_address: row.billing_address,
            shipping_address: row.shipping_address,
            notes: row.notes,
            status,
            payment_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_order(row: Option<OrderRow>) -> StoreResult<Option<Order>> {
    row.map(Order::try_from).transpose()
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, email, payment_method, subtotal, \
     tax_amount, shipping_amount, discount_amount, total_amount, billing_address, \
     shipping_address, notes, status, payment_status, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, price, stock, is_active, updated_at";

const CART_ITEM_COLUMNS: &str =
    "id, cart_id, product_id, variant_id, quantity, price, created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, product_id, user_id, order_id, rating, title, comment, \
     is_verified, helpful_count, not_helpful_count, created_at";

/// One open PostgreSQL transaction
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    // ── Users ──

    async fn find_user(&mut self, id: i64) -> StoreResult<Option<User>> {
        sqlx::query_as("SELECT id, email, name, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)
    }

    // ── Products / stock ──

    async fn find_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
        sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn lock_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
        sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn lock_products(&mut self, ids: &[i64]) -> StoreResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn write_stock(&mut self, id: i64, stock: i32, now: i64) -> StoreResult<()> {
        sqlx::query("UPDATE products SET stock = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(stock)
            .bind(now)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(())
    }

    // ── Carts ──

    async fn insert_cart(&mut self, cart: &Cart) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO carts (id, user_id, session_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(cart.id)
        .bind(cart.user_id)
        .bind(&cart.session_id)
        .bind(cart.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn find_cart(&mut self, id: i64) -> StoreResult<Option<Cart>> {
        sqlx::query_as("SELECT id, user_id, session_id, created_at FROM carts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)
    }

    async fn find_cart_by_user(&mut self, user_id: i64) -> StoreResult<Option<Cart>> {
        sqlx::query_as(
            "SELECT id, user_id, session_id, created_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn delete_cart(&mut self, id: i64) -> StoreResult<Option<Cart>> {
        // cart_items cascade
        sqlx::query_as(
            "DELETE FROM carts WHERE id = $1 RETURNING id, user_id, session_id, created_at",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn cart_items(&mut self, cart_id: i64) -> StoreResult<Vec<CartItem>> {
        sqlx::query_as(&format!(
            "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY created_at, id"
        ))
        .bind(cart_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn find_cart_item(&mut self, id: i64) -> StoreResult<Option<CartItem>> {
        sqlx::query_as(&format!(
            "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn find_cart_line(
        &mut self,
        cart_id: i64,
        product_id: i64,
        variant_id: Option<i64>,
    ) -> StoreResult<Option<CartItem>> {
        sqlx::query_as(&format!(
            "SELECT {CART_ITEM_COLUMNS} FROM cart_items \
             WHERE cart_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3"
        ))
        .bind(cart_id)
        .bind(product_id)
        .bind(variant_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, cart_id, product_id, variant_id, quantity, price, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id)
        .bind(item.cart_id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn update_cart_item(
        &mut self,
        id: i64,
        quantity: i32,
        price: Decimal,
        now: i64,
    ) -> StoreResult<Option<CartItem>> {
        sqlx::query_as(&format!(
            "UPDATE cart_items SET quantity = $2, price = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {CART_ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(quantity)
        .bind(price)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn delete_cart_item(&mut self, id: i64) -> StoreResult<Option<CartItem>> {
        sqlx::query_as(&format!(
            "DELETE FROM cart_items WHERE id = $1 RETURNING {CART_ITEM_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    // ── Orders ──

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, email, payment_method,
                subtotal, tax_amount, shipping_amount, discount_amount, total_amount,
                billing_address, shipping_address, notes, status, payment_status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(&order.email)
        .bind(&order.payment_method)
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.shipping_amount)
        .bind(order.discount_amount)
        .bind(order.total_amount)
        .bind(&order.billing_address)
        .bind(&order.shipping_address)
        .bind(&order.notes)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        let order_ids: Vec<i64> = items.iter().map(|i| i.order_id).collect();
        let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        let names: Vec<String> = items.iter().map(|i| i.product_name.clone()).collect();
        let skus: Vec<Option<String>> = items.iter().map(|i| i.sku.clone()).collect();
        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
        let prices: Vec<Decimal> = items.iter().map(|i| i.price).collect();
        let totals: Vec<Decimal> = items.iter().map(|i| i.total).collect();
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, product_name, sku, quantity, price, total
            )
            SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[], $4::text[], $5::text[], $6::integer[], $7::numeric[], $8::numeric[])
            "#,
        )
        .bind(&ids)
        .bind(&order_ids)
        .bind(&product_ids)
        .bind(&names)
        .bind(&skus)
        .bind(&quantities)
        .bind(&prices)
        .bind(&totals)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn find_order(&mut self, id: i64) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(classify)?;
        into_order(row)
    }

    async fn lock_order(&mut self, id: i64) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)?;
        into_order(row)
    }

    async fn order_items(&mut self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
        sqlx::query_as(
            r#"
            SELECT id, order_id, product_id, product_name, sku, quantity, price, total
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn orders_by_user(&mut self, user_id: i64) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn all_orders(&mut self) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn delete_order(&mut self, id: i64) -> StoreResult<Option<Order>> {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "DELETE FROM orders WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)?;
        into_order(row)
    }

    async fn update_order_status(
        &mut self,
        id: i64,
        status: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)?;
        into_order(row)
    }

    async fn update_payment_status(
        &mut self,
        id: i64,
        status: PaymentStatus,
        now: i64,
    ) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET payment_status = $2, updated_at = $3 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)?;
        into_order(row)
    }

    // ── Reviews / votes ──

    async fn insert_review(&mut self, review: &ProductReview) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO product_reviews (
                id, product_id, user_id, order_id, rating, title, comment,
                is_verified, helpful_count, not_helpful_count, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(review.id)
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(review.order_id)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.comment)
        .bind(review.is_verified)
        .bind(review.helpful_count)
        .bind(review.not_helpful_count)
        .bind(review.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn find_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>> {
        sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM product_reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn lock_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>> {
        sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM product_reviews WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn reviews_by_product(&mut self, product_id: i64) -> StoreResult<Vec<ProductReview>> {
        sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM product_reviews WHERE product_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(product_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn update_review_content(
        &mut self,
        id: i64,
        rating: i32,
        title: Option<&str>,
        comment: Option<&str>,
    ) -> StoreResult<Option<ProductReview>> {
        sqlx::query_as(&format!(
            "UPDATE product_reviews SET rating = $2, title = $3, comment = $4 \
             WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .bind(rating)
        .bind(title)
        .bind(comment)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn delete_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>> {
        sqlx::query("DELETE FROM review_votes WHERE review_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        sqlx::query_as(&format!(
            "DELETE FROM product_reviews WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn review_votes(&mut self, review_id: i64) -> StoreResult<Vec<ReviewVote>> {
        sqlx::query_as(
            "SELECT review_id, user_id, is_helpful, created_at FROM review_votes \
             WHERE review_id = $1 ORDER BY created_at, user_id",
        )
        .bind(review_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn find_vote(
        &mut self,
        review_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<ReviewVote>> {
        sqlx::query_as(
            "SELECT review_id, user_id, is_helpful, created_at FROM review_votes \
             WHERE review_id = $1 AND user_id = $2",
        )
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn insert_vote(&mut self, vote: &ReviewVote) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO review_votes (review_id, user_id, is_helpful, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(vote.review_id)
        .bind(vote.user_id)
        .bind(vote.is_helpful)
        .bind(vote.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn update_vote(
        &mut self,
        review_id: i64,
        user_id: i64,
        is_helpful: bool,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE review_votes SET is_helpful = $3 WHERE review_id = $1 AND user_id = $2",
        )
        .bind(review_id)
        .bind(user_id)
        .bind(is_helpful)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn delete_vote(&mut self, review_id: i64, user_id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM review_votes WHERE review_id = $1 AND user_id = $2")
            .bind(review_id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn count_votes(&mut self, review_id: i64) -> StoreResult<VoteCounts> {
        let (helpful, not_helpful): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE is_helpful),
                COUNT(*) FILTER (WHERE NOT is_helpful)
            FROM review_votes
            WHERE review_id = $1
            "#,
        )
        .bind(review_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(VoteCounts {
            helpful,
            not_helpful,
        })
    }

    async fn adjust_review_counts(
        &mut self,
        review_id: i64,
        helpful_delta: i32,
        not_helpful_delta: i32,
    ) -> StoreResult<ProductReview> {
        sqlx::query_as(&format!(
            "UPDATE product_reviews \
             SET helpful_count = helpful_count + $2, not_helpful_count = not_helpful_count + $3 \
             WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review_id)
        .bind(helpful_delta)
        .bind(not_helpful_delta)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn write_review_counts(
        &mut self,
        review_id: i64,
        helpful: i32,
        not_helpful: i32,
    ) -> StoreResult<ProductReview> {
        sqlx::query_as(&format!(
            "UPDATE product_reviews SET helpful_count = $2, not_helpful_count = $3 \
             WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review_id)
        .bind(helpful)
        .bind(not_helpful)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)
    }

    // ── Transaction control ──

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(classify)
    }
}
