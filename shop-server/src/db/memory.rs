//! In-process transactional store
//!
//! A transaction holds the table mutex for its whole lifetime and works on a
//! copy of the tables; commit publishes the copy, drop discards it.
//! Transactions are therefore fully serialized.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Cart, CartItem, Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductReview,
    ReviewVote, User,
};
use shared::util::{now_millis, snowflake_id};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, StoreError, StoreResult, StoreTx, UniqueKey, VoteCounts};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    products: BTreeMap<i64, Product>,
    carts: BTreeMap<i64, Cart>,
    cart_items: BTreeMap<i64, CartItem>,
    orders: BTreeMap<i64, Order>,
    order_items: BTreeMap<i64, OrderItem>,
    reviews: BTreeMap<i64, ProductReview>,
    votes: BTreeMap<(i64, i64), ReviewVote>,
}

/// In-memory [`Store`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Fixtures ──
    //
    // Seeding and committed-state reads below bypass transactions. They
    // exist for tests and local development only; services never call them.

    /// Insert a user directly. Test and development use only.
    pub async fn seed_user(&self, email: &str) -> User {
        let user = User {
            id: snowflake_id(),
            email: email.to_string(),
            name: None,
            created_at: now_millis(),
        };
        self.tables
            .lock()
            .await
            .users
            .insert(user.id, user.clone());
        user
    }

    /// Insert a product directly. Test and development use only.
    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> Product {
        let product = Product {
            id: snowflake_id(),
            name: name.to_string(),
            price,
            stock,
            is_active: true,
            updated_at: now_millis(),
        };
        self.tables
            .lock()
            .await
            .products
            .insert(product.id, product.clone());
        product
    }

    /// Change a product price outside of any service operation. Test and
    /// development use only.
    pub async fn set_price(&self, product_id: i64, price: Decimal) {
        if let Some(p) = self.tables.lock().await.products.get_mut(&product_id) {
            p.price = price;
        }
    }

    // ── Committed-state reads (test and development use only) ──

    pub async fn product_stock(&self, product_id: i64) -> Option<i32> {
        self.tables
            .lock()
            .await
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    pub async fn vote_rows(&self, review_id: i64) -> Vec<ReviewVote> {
        self.tables
            .lock()
            .await
            .votes
            .values()
            .filter(|v| v.review_id == review_id)
            .cloned()
            .collect()
    }

    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }

    pub async fn order_item_count(&self, order_id: i64) -> usize {
        self.tables
            .lock()
            .await
            .order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .count()
    }

    pub async fn cart_line_count(&self, cart_id: i64) -> usize {
        self.tables
            .lock()
            .await
            .cart_items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Open in-memory transaction
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

impl MemoryTx {
    fn review_mut(&mut self, id: i64) -> StoreResult<&mut ProductReview> {
        self.work
            .reviews
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupted(format!("review {id} vanished")))
    }
}

fn non_negative_count(value: i32, column: &str) -> StoreResult<i32> {
    if value < 0 {
        return Err(StoreError::Corrupted(format!("{column} below zero")));
    }
    Ok(value)
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_user(&mut self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn find_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
        Ok(self.work.products.get(&id).cloned())
    }

    async fn lock_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
        Ok(self.work.products.get(&id).cloned())
    }

    async fn lock_products(&mut self, ids: &[i64]) -> StoreResult<Vec<Product>> {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        Ok(sorted
            .iter()
            .filter_map(|id| self.work.products.get(id).cloned())
            .collect())
    }

    async fn write_stock(&mut self, id: i64, stock: i32, now: i64) -> StoreResult<()> {
        let stock = non_negative_count(stock, "stock")?;
        if let Some(p) = self.work.products.get_mut(&id) {
            p.stock = stock;
            p.updated_at = now;
        }
        Ok(())
    }

    async fn insert_cart(&mut self, cart: &Cart) -> StoreResult<()> {
        if cart.user_id.is_some() && self.work.carts.values().any(|c| c.user_id == cart.user_id) {
            return Err(StoreError::UniqueViolation(UniqueKey::CartOwner));
        }
        if self.work.carts.contains_key(&cart.id) {
            return Err(StoreError::UniqueViolation(UniqueKey::Other));
        }
        self.work.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn find_cart(&mut self, id: i64) -> StoreResult<Option<Cart>> {
        Ok(self.work.carts.get(&id).cloned())
    }

    async fn find_cart_by_user(&mut self, user_id: i64) -> StoreResult<Option<Cart>> {
        Ok(self
            .work
            .carts
            .values()
            .find(|c| c.user_id == Some(user_id))
            .cloned())
    }

    async fn delete_cart(&mut self, id: i64) -> StoreResult<Option<Cart>> {
        let removed = self.work.carts.remove(&id);
        if removed.is_some() {
            self.work.cart_items.retain(|_, item| item.cart_id != id);
        }
        Ok(removed)
    }

    async fn cart_items(&mut self, cart_id: i64) -> StoreResult<Vec<CartItem>> {
        let mut items: Vec<CartItem> = self
            .work
            .cart_items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.created_at, i.id));
        Ok(items)
    }

    async fn find_cart_item(&mut self, id: i64) -> StoreResult<Option<CartItem>> {
        Ok(self.work.cart_items.get(&id).cloned())
    }

    async fn find_cart_line(
        &mut self,
        cart_id: i64,
        product_id: i64,
        variant_id: Option<i64>,
    ) -> StoreResult<Option<CartItem>> {
        Ok(self
            .work
            .cart_items
            .values()
            .find(|i| i.cart_id == cart_id && i.product_id == product_id && i.variant_id == variant_id)
            .cloned())
    }

    async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()> {
        let duplicate = self.work.cart_items.values().any(|i| {
            i.cart_id == item.cart_id
                && i.product_id == item.product_id
                && i.variant_id == item.variant_id
        });
        if duplicate {
            return Err(StoreError::UniqueViolation(UniqueKey::CartLine));
        }
        self.work.cart_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_cart_item(
        &mut self,
        id: i64,
        quantity: i32,
        price: Decimal,
        now: i64,
    ) -> StoreResult<Option<CartItem>> {
        Ok(self.work.cart_items.get_mut(&id).map(|item| {
            item.quantity = quantity;
            item.price = price;
            item.updated_at = now;
            item.clone()
        }))
    }

    async fn delete_cart_item(&mut self, id: i64) -> StoreResult<Option<CartItem>> {
        Ok(self.work.cart_items.remove(&id))
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        if self
            .work
            .orders
            .values()
            .any(|o| o.id == order.id || o.order_number == order.order_number)
        {
            return Err(StoreError::UniqueViolation(UniqueKey::Other));
        }
        self.work.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()> {
        for item in items {
            if self.work.order_items.contains_key(&item.id) {
                return Err(StoreError::UniqueViolation(UniqueKey::Other));
            }
            self.work.order_items.insert(item.id, item.clone());
        }
        Ok(())
    }

    async fn find_order(&mut self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn lock_order(&mut self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn order_items(&mut self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
        Ok(self
            .work
            .order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn orders_by_user(&mut self, user_id: i64) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .work
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    async fn all_orders(&mut self) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.work.orders.values().cloned().collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    async fn delete_order(&mut self, id: i64) -> StoreResult<Option<Order>> {
        self.work.order_items.retain(|_, item| item.order_id != id);
        Ok(self.work.orders.remove(&id))
    }

    async fn update_order_status(
        &mut self,
        id: i64,
        status: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>> {
        Ok(self.work.orders.get_mut(&id).map(|o| {
            o.status = status;
            o.updated_at = now;
            o.clone()
        }))
    }

    async fn update_payment_status(
        &mut self,
        id: i64,
        status: PaymentStatus,
        now: i64,
    ) -> StoreResult<Option<Order>> {
        Ok(self.work.orders.get_mut(&id).map(|o| {
            o.payment_status = status;
            o.updated_at = now;
            o.clone()
        }))
    }

    async fn insert_review(&mut self, review: &ProductReview) -> StoreResult<()> {
        if self
            .work
            .reviews
            .values()
            .any(|r| r.product_id == review.product_id && r.user_id == review.user_id)
        {
            return Err(StoreError::UniqueViolation(UniqueKey::ReviewAuthor));
        }
        self.work.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn find_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>> {
        Ok(self.work.reviews.get(&id).cloned())
    }

    async fn lock_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>> {
        Ok(self.work.reviews.get(&id).cloned())
    }

    async fn reviews_by_product(&mut self, product_id: i64) -> StoreResult<Vec<ProductReview>> {
        let mut reviews: Vec<ProductReview> = self
            .work
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(reviews)
    }

    async fn update_review_content(
        &mut self,
        id: i64,
        rating: i32,
        title: Option<&str>,
        comment: Option<&str>,
    ) -> StoreResult<Option<ProductReview>> {
        Ok(self.work.reviews.get_mut(&id).map(|r| {
            r.rating = rating;
            r.title = title.map(str::to_string);
            r.comment = comment.map(str::to_string);
            r.clone()
        }))
    }

    async fn delete_review(&mut self, id: i64) -> StoreResult<Option<ProductReview>> {
        self.work.votes.retain(|(review_id, _), _| *review_id != id);
        Ok(self.work.reviews.remove(&id))
    }

    async fn review_votes(&mut self, review_id: i64) -> StoreResult<Vec<ReviewVote>> {
        let mut votes: Vec<ReviewVote> = self
            .work
            .votes
            .values()
            .filter(|v| v.review_id == review_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| (v.created_at, v.user_id));
        Ok(votes)
    }

    async fn find_vote(
        &mut self,
        review_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<ReviewVote>> {
        Ok(self.work.votes.get(&(review_id, user_id)).cloned())
    }

    async fn insert_vote(&mut self, vote: &ReviewVote) -> StoreResult<()> {
        let key = (vote.review_id, vote.user_id);
        if self.work.votes.contains_key(&key) {
            return Err(StoreError::UniqueViolation(UniqueKey::ReviewVote));
        }
        self.work.votes.insert(key, vote.clone());
        Ok(())
    }

    async fn update_vote(
        &mut self,
        review_id: i64,
        user_id: i64,
        is_helpful: bool,
    ) -> StoreResult<()> {
        if let Some(vote) = self.work.votes.get_mut(&(review_id, user_id)) {
            vote.is_helpful = is_helpful;
        }
        Ok(())
    }

    async fn delete_vote(&mut self, review_id: i64, user_id: i64) -> StoreResult<()> {
        self.work.votes.remove(&(review_id, user_id));
        Ok(())
    }

    async fn count_votes(&mut self, review_id: i64) -> StoreResult<VoteCounts> {
        let mut counts = VoteCounts::default();
        for vote in self.work.votes.values().filter(|v| v.review_id == review_id) {
            if vote.is_helpful {
                counts.helpful += 1;
            } else {
                counts.not_helpful += 1;
            }
        }
        Ok(counts)
    }

    async fn adjust_review_counts(
        &mut self,
        review_id: i64,
        helpful_delta: i32,
        not_helpful_delta: i32,
    ) -> StoreResult<ProductReview> {
        let review = self.review_mut(review_id)?;
        let helpful = non_negative_count(review.helpful_count + helpful_delta, "helpful_count")?;
        let not_helpful = non_negative_count(
            review.not_helpful_count + not_helpful_delta,
            "not_helpful_count",
        )?;
        review.helpful_count = helpful;
        review.not_helpful_count = not_helpful;
        Ok(review.clone())
    }

    async fn write_review_counts(
        &mut self,
        review_id: i64,
        helpful: i32,
        not_helpful: i32,
    ) -> StoreResult<ProductReview> {
        let review = self.review_mut(review_id)?;
        review.helpful_count = non_negative_count(helpful, "helpful_count")?;
        review.not_helpful_count = non_negative_count(not_helpful, "not_helpful_count")?;
        Ok(review.clone())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}
