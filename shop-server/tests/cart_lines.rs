mod common;

use common::{Fixture, money};
use shared::error::ErrorCode;
use shared::models::{CartCreate, CartItemCreate};
use shop_server::service::{cart, order};

fn add(product_id: i64, variant_id: Option<i64>, quantity: i32) -> CartItemCreate {
    CartItemCreate {
        product_id: Some(product_id),
        variant_id,
        quantity: Some(quantity),
    }
}

#[tokio::test]
async fn test_duplicate_add_keeps_one_line() {
    let fx = Fixture::new().await;
    let p = fx.product("Socks", 450, 20).await;
    let c = cart::create_cart(
        &fx.store,
        CartCreate {
            user_id: Some(fx.user.id),
            session_id: None,
        },
    )
    .await
    .unwrap();

    cart::add_item(&fx.store, c.id, add(p.id, None, 2)).await.unwrap();
    let err = cart::add_item(&fx.store, c.id, add(p.id, None, 1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CartLineExists);

    // A variant is a different line
    cart::add_item(&fx.store, c.id, add(p.id, Some(3), 1)).await.unwrap();

    assert_eq!(fx.store.cart_line_count(c.id).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_adds() {
    let fx = Fixture::new().await;
    let p = fx.product("Socks", 450, 20).await;
    let c = cart::create_cart(
        &fx.store,
        CartCreate {
            user_id: None,
            session_id: Some("guest".into()),
        },
    )
    .await
    .unwrap();

    let (cart_id, product_id) = (c.id, p.id);
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let store = fx.store.clone();
            tokio::spawn(async move { cart::add_item(&store, cart_id, add(product_id, None, 1)).await })
        })
        .collect();
    let mut ok = 0;
    for result in futures::future::join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => assert_eq!(e.code(), ErrorCode::CartLineExists),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(fx.store.cart_line_count(c.id).await, 1);
}

#[tokio::test]
async fn test_cart_does_not_reserve_stock() {
    let fx = Fixture::new().await;
    let p = fx.product("Lamp", 3999, 2).await;
    let c = cart::create_cart(
        &fx.store,
        CartCreate {
            user_id: None,
            session_id: Some("guest".into()),
        },
    )
    .await
    .unwrap();

    let item = cart::add_item(&fx.store, c.id, add(p.id, None, 2)).await.unwrap();
    assert_eq!(item.price, money(7998));
    assert_eq!(fx.stock(p.id).await, 2);

    // Someone else buys the stock; the cart line stays as written
    order::place_order(
        &fx.store,
        common::order_for(fx.user.id, vec![common::line(p.id, 2)]),
    )
    .await
    .unwrap();

    let detail = cart::get_cart(&fx.store, c.id).await.unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 2);

    let err = cart::update_quantity(
        &fx.store,
        item.id,
        shared::models::CartItemUpdate { quantity: Some(1) },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);
}
