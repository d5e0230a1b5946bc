//! Database access layer
//!
//! Every service operation runs inside one [`StoreTx`]: the unit of
//! atomicity. Dropping a transaction without [`StoreTx::commit`] rolls it
//! back, so an early `?` return never leaves partial writes behind.
//!
//! Two backends:
//! 1. [`postgres::PgStore`]: row locks (`SELECT ... FOR UPDATE`) on the rows a
//!    check-then-act depends on
//! 2. [`memory::MemoryStore`]: fully serialized transactions over in-process
//!    tables (tests, local development)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::models::{
    Cart, CartItem, Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductReview,
    ReviewVote, User,
};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Unique constraints the services react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    /// (cart_id, product_id, variant_id)
    CartLine,
    /// one cart per user
    CartOwner,
    /// (product_id, user_id) on reviews
    ReviewAuthor,
    /// (review_id, user_id) on votes
    ReviewVote,
    /// any other unique / primary key
    Other,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Serialization failure or deadlock, the transaction was aborted
    #[error("Transaction aborted by concurrent modification")]
    Conflict,

    #[error("Unique constraint violated: {0:?}")]
    UniqueViolation(UniqueKey),

    #[error("Corrupted row: {0}")]
    Corrupted(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Vote counts recomputed from the vote rows of one review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCounts {
    pub helpful: i64,
    pub not_helpful: i64,
}

/// A transactional store
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Open a new atomic unit
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Liveness check
    async fn ping(&self) -> StoreResult<()>;
}

/// One open transaction.
///
/// `lock_*` methods read the row and hold it until the transaction ends, so
/// that decisions taken on the value stay valid until commit. `find_*`
/// methods are plain reads.
#[async_trait]
pub trait StoreTx: Send {
    // ── Users ──

    async fn find_user(&mut self, id: i64) -> StoreResult<Option<User>>;

    // ── Products / stock ──

    async fn find_product(&mut self, id: i64) -> StoreResult<Option<Product>>;

    /// Lock one product row
    async fn lock_product(&mut self, id: i64) -> StoreResult<Option<Product>>;

    /// Lock a batch of product rows in ascending id order. Missing ids are
    /// simply absent from the result.
    async fn lock_products(&mut self, ids: &[i64]) -> StoreResult<Vec<Product>>;

    /// Overwrite the stock of a product. Callers hold the row lock.
    async fn write_stock(&mut self, id: i64, stock: i32, now: i64) -> StoreResult<()>;

    // ── Carts ──

    async fn insert_cart(&mut self, cart: &Cart) -> StoreResult<()>;

    async fn find_cart(&mut self, id: i64) -> StoreResult<Option<Cart>>;

    async fn find_cart_by_user(&mut self, user_id: i64) -> StoreResult<Option<Cart>>;

    /// Delete a cart and its lines, returning the deleted cart
    async fn delete_cart(&mut self, id: i64) -> StoreResult<Option<Cart>>;

    async fn cart_items(&mut self, cart_id: i64) -> StoreResult<Vec<CartItem>>;

    async fn find_cart_item(&mut self, id: i64) -> StoreResult<Option<CartItem>>;

    async fn find_cart_line(
        &mut self,
        cart_id: i64,
        product_id: i64,
        variant_id: Option<i64>,
    ) -> StoreResult<Option<CartItem>>;

    /// Fails with [`UniqueKey::CartLine`] when the line already exists
    async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()>;

    async fn update_cart_item(
        &mut self,
        id: i64,
        quantity: i32,
        price: rust_decimal::Decimal,
        now: i64,
    ) -> StoreResult<Option<CartItem>>;

    async fn delete_cart_item(&mut self, id: i64) -> StoreResult<Option<CartItem>>;

    // ── Orders ──

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()>;

    async fn find_order(&mut self, id: i64) -> StoreResult<Option<Order>>;

    /// Lock one order row
    async fn lock_order(&mut self, id: i64) -> StoreResult<Option<Order>>;

    async fn order_items(&mut self, order_id: i64) -> StoreResult<Vec<OrderItem>>;

    /// Newest first
    async fn orders_by_user(&mut self, user_id: i64) -> StoreResult<Vec<Order>>;

    /// Every order, newest first
    async fn all_orders(&mut self) -> StoreResult<Vec<Order>>;

    /// Delete an order header and all of its items
    async fn delete_order(&mut self, id: i64) -> StoreResult<Option<Order>>;

    async fn update_order_status(
        &mut self,
        id: i64,
        status: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>>;

    async fn update_payment_status(
        &mut self,
        id: i64,
        status: PaymentStatus,
        now: i64,
    ) -> StoreResult<Option<Order>>;

    // ── Reviews / votes ──

    /// Fails with [`UniqueKey::ReviewAuthor`] on a second review of the same product
    async fn insert_review(&mut self, review: &ProductReview) -> StoreResult<()>;

    async fn find_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>>;

    /// Lock one review row; serializes every vote on that review
    async fn lock_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>>;

    /// Newest first
    async fn reviews_by_product(&mut self, product_id: i64) -> StoreResult<Vec<ProductReview>>;

    /// Overwrite the author-editable fields, leaving the counters alone
    async fn update_review_content(
        &mut self,
        id: i64,
        rating: i32,
        title: Option<&str>,
        comment: Option<&str>,
    ) -> StoreResult<Option<ProductReview>>;

    /// Delete a review together with all of its vote rows
    async fn delete_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>>;

    /// Vote rows of one review, oldest first
    async fn review_votes(&mut self, review_id: i64) -> StoreResult<Vec<ReviewVote>>;

    async fn find_vote(&mut self, review_id: i64, user_id: i64)
    -> StoreResult<Option<ReviewVote>>;

    async fn insert_vote(&mut self, vote: &ReviewVote) -> StoreResult<()>;

    async fn update_vote(&mut self, review_id: i64, user_id: i64, is_helpful: bool)
    -> StoreResult<()>;

    async fn delete_vote(&mut self, review_id: i64, user_id: i64) -> StoreResult<()>;

    async fn count_votes(&mut self, review_id: i64) -> StoreResult<VoteCounts>;

    /// Apply deltas to the cached counters and return the updated review
    async fn adjust_review_counts(
        &mut self,
        review_id: i64,
        helpful_delta: i32,
        not_helpful_delta: i32,
    ) -> StoreResult<ProductReview>;

    /// Overwrite the cached counters
    async fn write_review_counts(
        &mut self,
        review_id: i64,
        helpful: i32,
        not_helpful: i32,
    ) -> StoreResult<ProductReview>;

    // ── Transaction control ──

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
