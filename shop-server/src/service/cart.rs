//! Cart Mutator
//!
//! Line prices are captured as `unit_price x quantity` when a line is written.
//! Stock checks here are advisory: nothing is reserved, a later order may
//! still fail when stock has moved.

use shared::error::{AppError, ErrorCode};
use shared::models::{Cart, CartCreate, CartDetail, CartItem, CartItemCreate, CartItemUpdate, CartSummary};
use shared::util::{line_total, now_millis, snowflake_id};

use super::ledger::{self, product_not_found};
use crate::db::{Store, StoreError, UniqueKey};
use crate::error::{ServiceError, ServiceResult};
use crate::validation::{
    MAX_SHORT_TEXT_LEN, ensure_storable, require, validate_optional_text, validate_quantity,
};

fn cart_not_found(cart_id: i64) -> AppError {
    AppError::with_message(ErrorCode::CartNotFound, format!("Cart {cart_id} not found"))
        .with_detail("cart_id", cart_id)
}

fn item_not_found(item_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::CartItemNotFound,
        format!("Cart item {item_id} not found"),
    )
    .with_detail("item_id", item_id)
}

fn duplicate_line(cart_id: i64, product_id: i64, variant_id: Option<i64>) -> AppError {
    let err = AppError::with_message(
        ErrorCode::CartLineExists,
        "Product is already in the cart, update its quantity instead",
    )
    .with_detail("cart_id", cart_id)
    .with_detail("product_id", product_id);
    match variant_id {
        Some(v) => err.with_detail("variant_id", v),
        None => err,
    }
}

pub async fn create_cart(store: &dyn Store, data: CartCreate) -> ServiceResult<Cart> {
    if data.user_id.is_none() && data.session_id.is_none() {
        return Err(AppError::required("user_id or session_id").into());
    }
    validate_optional_text(&data.session_id, "session_id", MAX_SHORT_TEXT_LEN)?;

    let mut tx = store.begin().await?;

    if let Some(user_id) = data.user_id {
        if tx.find_user(user_id).await?.is_none() {
            return Err(AppError::with_message(
                ErrorCode::UserNotFound,
                format!("User {user_id} not found"),
            )
            .with_detail("user_id", user_id)
            .into());
        }
        if tx.find_cart_by_user(user_id).await?.is_some() {
            return Err(cart_exists(user_id).into());
        }
    }

    let cart = Cart {
        id: snowflake_id(),
        user_id: data.user_id,
        session_id: data.session_id,
        created_at: now_millis(),
    };
    match tx.insert_cart(&cart).await {
        Ok(()) => {}
        Err(StoreError::UniqueViolation(UniqueKey::CartOwner)) => {
            return Err(cart_exists(cart.user_id.unwrap_or_default()).into());
        }
        Err(e) => return Err(e.into()),
    }
    tx.commit().await?;

    tracing::info!(cart_id = cart.id, user_id = ?cart.user_id, "Cart created");
    Ok(cart)
}

fn cart_exists(user_id: i64) -> AppError {
    AppError::with_message(ErrorCode::CartAlreadyExists, "User already has a cart")
        .with_detail("user_id", user_id)
}

pub async fn get_cart(store: &dyn Store, cart_id: i64) -> ServiceResult<CartDetail> {
    let mut tx = store.begin().await?;
    let cart = tx
        .find_cart(cart_id)
        .await?
        .ok_or_else(|| cart_not_found(cart_id))?;
    let items = tx.cart_items(cart_id).await?;
    let summary = CartSummary::from_items(&items);
    Ok(CartDetail {
        cart,
        items,
        summary,
    })
}

pub async fn delete_cart(store: &dyn Store, cart_id: i64) -> ServiceResult<Cart> {
    let mut tx = store.begin().await?;
    let cart = tx
        .delete_cart(cart_id)
        .await?
        .ok_or_else(|| cart_not_found(cart_id))?;
    tx.commit().await?;

    tracing::info!(cart_id, "Cart deleted");
    Ok(cart)
}

/// Add a new line to a cart
pub async fn add_item(
    store: &dyn Store,
    cart_id: i64,
    data: CartItemCreate,
) -> ServiceResult<CartItem> {
    let product_id = require(data.product_id, "product_id")?;
    let quantity = require(data.quantity, "quantity")?;
    validate_quantity(quantity, "quantity")?;
    let variant_id = data.variant_id;

    let mut tx = store.begin().await?;

    tx.find_cart(cart_id)
        .await?
        .ok_or_else(|| cart_not_found(cart_id))?;
    let product = tx
        .find_product(product_id)
        .await?
        .ok_or_else(|| product_not_found(product_id))?;
    ledger::ensure_available(&product, quantity)?;
    let price = ensure_storable(line_total(product.price, quantity), "price")?;

    if tx
        .find_cart_line(cart_id, product_id, variant_id)
        .await?
        .is_some()
    {
        return Err(duplicate_line(cart_id, product_id, variant_id).into());
    }

    let now = now_millis();
    let item = CartItem {
        id: snowflake_id(),
        cart_id,
        product_id,
        variant_id,
        quantity,
        price,
        created_at: now,
        updated_at: now,
    };
    // A concurrent add of the same line loses here
    tx.insert_cart_item(&item).await.map_err(|e| match e {
        StoreError::UniqueViolation(UniqueKey::CartLine) => {
            tracing::warn!(cart_id, product_id, "Concurrent add of the same cart line");
            ServiceError::from(duplicate_line(cart_id, product_id, variant_id))
        }
        other => other.into(),
    })?;
    tx.commit().await?;

    tracing::info!(cart_id, item_id = item.id, product_id, quantity, "Cart line added");
    Ok(item)
}

/// Change the quantity of a line and re-price it at the current unit price
pub async fn update_quantity(
    store: &dyn Store,
    item_id: i64,
    data: CartItemUpdate,
) -> ServiceResult<CartItem> {
    let quantity = require(data.quantity, "quantity")?;
    validate_quantity(quantity, "quantity")?;

    let mut tx = store.begin().await?;

    let item = tx
        .find_cart_item(item_id)
        .await?
        .ok_or_else(|| item_not_found(item_id))?;
    let product = tx
        .find_product(item.product_id)
        .await?
        .ok_or_else(|| product_not_found(item.product_id))?;
    ledger::ensure_available(&product, quantity)?;
    let price = ensure_storable(line_total(product.price, quantity), "price")?;

    let updated = tx
        .update_cart_item(item_id, quantity, price, now_millis())
        .await?
        .ok_or_else(|| item_not_found(item_id))?;
    tx.commit().await?;

    tracing::info!(item_id, cart_id = updated.cart_id, quantity, "Cart line updated");
    Ok(updated)
}

pub async fn remove_item(store: &dyn Store, item_id: i64) -> ServiceResult<CartItem> {
    let mut tx = store.begin().await?;
    let item = tx
        .delete_cart_item(item_id)
        .await?
        .ok_or_else(|| item_not_found(item_id))?;
    tx.commit().await?;

    tracing::info!(item_id, cart_id = item.cart_id, "Cart line removed");
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use rust_decimal::Decimal;

    async fn session_cart(store: &MemoryStore) -> Cart {
        create_cart(
            store,
            CartCreate {
                user_id: None,
                session_id: Some("sess-1".into()),
            },
        )
        .await
        .unwrap()
    }

    fn add(product_id: i64, quantity: i32) -> CartItemCreate {
        CartItemCreate {
            product_id: Some(product_id),
            variant_id: None,
            quantity: Some(quantity),
        }
    }

    #[tokio::test]
    async fn test_add_item_prices_line() {
        let store = MemoryStore::new();
        let product = store.seed_product("Tea", Decimal::new(250, 2), 10).await;
        let cart = session_cart(&store).await;

        let item = add_item(&store, cart.id, add(product.id, 3)).await.unwrap();
        assert_eq!(item.price, Decimal::new(750, 2));
        assert_eq!(item.quantity, 3);
    }

    #[tokio::test]
    async fn test_add_item_rejections() {
        let store = MemoryStore::new();
        let product = store.seed_product("Tea", Decimal::new(250, 2), 2).await;
        let cart = session_cart(&store).await;

        let err = add_item(&store, cart.id, add(product.id, 0)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);

        let err = add_item(&store, cart.id, add(product.id, 3)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        let err = add_item(&store, cart.id, add(999, 1)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProductNotFound);

        let err = add_item(&store, 999, add(product.id, 1)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CartNotFound);

        assert_eq!(store.cart_line_count(cart.id).await, 0);
    }

    #[tokio::test]
    async fn test_unstorable_line_price_rejected() {
        let store = MemoryStore::new();
        let product = store
            .seed_product("Yacht", Decimal::new(5_000_000_000, 0), 10)
            .await;
        let cart = session_cart(&store).await;

        let err = add_item(&store, cart.id, add(product.id, 3)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValueOutOfRange);

        let item = add_item(&store, cart.id, add(product.id, 1)).await.unwrap();
        let err = update_quantity(&store, item.id, CartItemUpdate { quantity: Some(2) })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValueOutOfRange);
        assert_eq!(store.cart_line_count(cart.id).await, 1);
    }

    #[tokio::test]
    async fn test_update_quantity_reprices_at_current_price() {
        let store = MemoryStore::new();
        let product = store.seed_product("Tea", Decimal::new(250, 2), 10).await;
        let cart = session_cart(&store).await;
        let item = add_item(&store, cart.id, add(product.id, 1)).await.unwrap();

        store.set_price(product.id, Decimal::new(300, 2)).await;
        let updated = update_quantity(&store, item.id, CartItemUpdate { quantity: Some(4) })
            .await
            .unwrap();
        assert_eq!(updated.price, Decimal::new(1200, 2));

        let err = update_quantity(&store, item.id, CartItemUpdate { quantity: Some(11) })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        let err = update_quantity(&store, 999, CartItemUpdate { quantity: Some(1) })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CartItemNotFound);
    }

    #[tokio::test]
    async fn test_remove_item() {
        let store = MemoryStore::new();
        let product = store.seed_product("Tea", Decimal::new(250, 2), 10).await;
        let cart = session_cart(&store).await;
        let item = add_item(&store, cart.id, add(product.id, 1)).await.unwrap();

        let removed = remove_item(&store, item.id).await.unwrap();
        assert_eq!(removed.id, item.id);
        let err = remove_item(&store, item.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CartItemNotFound);
    }

    #[tokio::test]
    async fn test_one_cart_per_user() {
        let store = MemoryStore::new();
        let user = store.seed_user("a@example.com").await;
        let data = CartCreate {
            user_id: Some(user.id),
            session_id: None,
        };

        create_cart(&store, data.clone()).await.unwrap();
        let err = create_cart(&store, data).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CartAlreadyExists);

        let err = create_cart(&store, CartCreate::default()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RequiredField);
    }

    #[tokio::test]
    async fn test_get_and_delete_cart() {
        let store = MemoryStore::new();
        let tea = store.seed_product("Tea", Decimal::new(250, 2), 10).await;
        let mug = store.seed_product("Mug", Decimal::new(800, 2), 10).await;
        let cart = session_cart(&store).await;
        add_item(&store, cart.id, add(tea.id, 2)).await.unwrap();
        add_item(&store, cart.id, add(mug.id, 1)).await.unwrap();

        let detail = get_cart(&store, cart.id).await.unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.summary.item_count, 3);
        assert_eq!(detail.summary.subtotal, Decimal::new(1300, 2));

        delete_cart(&store, cart.id).await.unwrap();
        assert_eq!(store.cart_line_count(cart.id).await, 0);
        let err = get_cart(&store, cart.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CartNotFound);
    }
}
