mod common;

use common::{Fixture, line, money, order_for};
use shared::error::ErrorCode;
use shared::models::{OrderStatus, OrderStatusUpdate, PaymentStatus, PaymentStatusUpdate};
use shop_server::service::order;

#[tokio::test]
async fn test_order_totals_match_items_and_charges() {
    let fx = Fixture::new().await;
    let book = fx.product("Book", 1250, 10).await;
    let pen = fx.product("Pen", 199, 10).await;

    let mut data = order_for(fx.user.id, vec![line(book.id, 2), line(pen.id, 3)]);
    data.tax_amount = Some(money(231));
    data.shipping_amount = Some(money(499));
    data.discount_amount = Some(money(300));

    let placed = order::place_order(&fx.store, data).await.unwrap();
    let o = &placed.order;

    let items_total: rust_decimal::Decimal = placed.items.iter().map(|i| i.total).sum();
    assert_eq!(o.subtotal, items_total);
    assert_eq!(o.subtotal, money(2500 + 597));
    assert_eq!(
        o.total_amount,
        o.subtotal + o.tax_amount + o.shipping_amount - o.discount_amount
    );
    assert_eq!(o.total_amount, money(3097 + 231 + 499 - 300));
    assert_eq!(o.status, OrderStatus::Pending);
    assert_eq!(o.payment_status, PaymentStatus::Pending);
    assert!(o.order_number.starts_with("ORD-"));

    let book_line = placed.items.iter().find(|i| i.product_id == book.id).unwrap();
    assert_eq!(book_line.product_name, "Book");
    assert_eq!(book_line.price, money(1250));

    assert_eq!(fx.stock(book.id).await, 8);
    assert_eq!(fx.stock(pen.id).await, 7);
}

#[tokio::test]
async fn test_shortfall_rejects_whole_order_without_debit() {
    let fx = Fixture::new().await;
    let a = fx.product("A", 1000, 5).await;
    let b = fx.product("B", 1000, 1).await;
    let c = fx.product("C", 1000, 0).await;

    let err = order::place_order(
        &fx.store,
        order_for(fx.user.id, vec![line(a.id, 2), line(b.id, 2), line(c.id, 1)]),
    )
    .await
    .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ProductOutOfStock);
    let app: shared::error::AppError = err.into();
    let listed = app.details.unwrap()["items"].as_array().unwrap().len();
    assert_eq!(listed, 2);

    assert_eq!(fx.stock(a.id).await, 5);
    assert_eq!(fx.stock(b.id).await, 1);
    assert_eq!(fx.stock(c.id).await, 0);
    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn test_missing_product_and_user() {
    let fx = Fixture::new().await;
    let a = fx.product("A", 1000, 5).await;

    let err = order::place_order(&fx.store, order_for(fx.user.id, vec![line(a.id, 1), line(404, 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProductNotFound);

    let err = order::place_order(&fx.store, order_for(999, vec![line(a.id, 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserNotFound);

    assert_eq!(fx.stock(a.id).await, 5);
    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn test_negative_total_rejected() {
    let fx = Fixture::new().await;
    let a = fx.product("A", 500, 5).await;

    let mut data = order_for(fx.user.id, vec![line(a.id, 1)]);
    data.discount_amount = Some(money(501));
    let err = order::place_order(&fx.store, data).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::OrderNegativeTotal);
    assert_eq!(fx.stock(a.id).await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_for_last_unit() {
    let fx = Fixture::new().await;
    let last = fx.product("Last", 2000, 1).await;

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let store = fx.store.clone();
            let data = order_for(fx.user.id, vec![line(last.id, 1)]);
            tokio::spawn(async move { order::place_order(&store, data).await })
        })
        .collect();

    let mut placed = 0;
    let mut out_of_stock = 0;
    for result in futures::future::join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => placed += 1,
            Err(e) if e.code() == ErrorCode::ProductOutOfStock => out_of_stock += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!((placed, out_of_stock), (1, 1));
    assert_eq!(fx.stock(last.id).await, 0);
    assert_eq!(fx.store.order_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stock_five_three_three_two() {
    let fx = Fixture::new().await;
    let p = fx.product("Widget", 750, 5).await;

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let store = fx.store.clone();
            let data = order_for(fx.user.id, vec![line(p.id, 3)]);
            tokio::spawn(async move { order::place_order(&store, data).await })
        })
        .collect();
    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failed = results.into_iter().find_map(|r| r.err()).unwrap();
    assert_eq!(failed.code(), ErrorCode::ProductOutOfStock);
    assert_eq!(fx.stock(p.id).await, 2);

    order::place_order(&fx.store, order_for(fx.user.id, vec![line(p.id, 2)]))
        .await
        .unwrap();
    assert_eq!(fx.stock(p.id).await, 0);
}

#[tokio::test]
async fn test_delete_pending_order_removes_items_and_restocks() {
    let fx = Fixture::new().await;
    let a = fx.product("A", 1000, 5).await;
    let b = fx.product("B", 300, 5).await;
    let placed = order::place_order(&fx.store, order_for(fx.user.id, vec![line(a.id, 2), line(b.id, 4)]))
        .await
        .unwrap();
    let order_id = placed.order.id;
    assert_eq!(fx.store.order_item_count(order_id).await, 2);

    let deleted = order::delete_order(&fx.store, order_id).await.unwrap();
    assert_eq!(deleted.id, order_id);
    assert_eq!(fx.store.order_item_count(order_id).await, 0);
    assert_eq!(fx.store.order_count().await, 0);
    assert_eq!(fx.stock(a.id).await, 5);
    assert_eq!(fx.stock(b.id).await, 5);

    let err = order::get_order(&fx.store, order_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotFound);
    let err = order::delete_order(&fx.store, order_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotFound);
}

#[tokio::test]
async fn test_delete_shipped_order_keeps_stock() {
    let fx = Fixture::new().await;
    let a = fx.product("A", 1000, 5).await;
    let placed = order::place_order(&fx.store, order_for(fx.user.id, vec![line(a.id, 2)]))
        .await
        .unwrap();

    order::update_order_status(
        &fx.store,
        placed.order.id,
        OrderStatusUpdate {
            status: OrderStatus::Shipped,
        },
    )
    .await
    .unwrap();
    order::delete_order(&fx.store, placed.order.id).await.unwrap();

    assert_eq!(fx.stock(a.id).await, 3);
    assert_eq!(fx.store.order_item_count(placed.order.id).await, 0);
}

#[tokio::test]
async fn test_status_updates_and_reads() {
    let fx = Fixture::new().await;
    let a = fx.product("A", 1000, 5).await;
    let first = order::place_order(&fx.store, order_for(fx.user.id, vec![line(a.id, 1)]))
        .await
        .unwrap();
    let second = order::place_order(&fx.store, order_for(fx.user.id, vec![line(a.id, 1)]))
        .await
        .unwrap();

    let updated = order::update_payment_status(
        &fx.store,
        first.order.id,
        PaymentStatusUpdate {
            status: PaymentStatus::Paid,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
    assert_eq!(updated.status, OrderStatus::Pending);

    let fetched = order::get_order(&fx.store, first.order.id).await.unwrap();
    assert_eq!(fetched.order.payment_status, PaymentStatus::Paid);
    assert_eq!(fetched.items.len(), 1);

    let listed = order::list_user_orders(&fx.store, fx.user.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|d| d.order.id == second.order.id));
    assert!(listed[0].order.created_at >= listed[1].order.created_at);

    let err = order::update_order_status(
        &fx.store,
        12345,
        OrderStatusUpdate {
            status: OrderStatus::Cancelled,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotFound);
}

#[tokio::test]
async fn test_oversized_amounts_fail_without_panic() {
    let fx = Fixture::new().await;
    let p = fx.product("Desk", 10_000, 5).await;

    let mut data = order_for(fx.user.id, vec![line(p.id, 1)]);
    data.tax_amount = Some(rust_decimal::Decimal::MAX);
    data.shipping_amount = Some(rust_decimal::Decimal::MAX);

    let store = fx.store.clone();
    let result = tokio::spawn(async move { order::place_order(&store, data).await })
        .await
        .expect("place_order must not panic");
    assert_eq!(result.unwrap_err().code(), ErrorCode::ValueOutOfRange);

    // Line totals past the stored precision are rejected too
    let yacht = fx.product("Yacht", 500_000_000_000, 5).await;
    let err = order::place_order(&fx.store, order_for(fx.user.id, vec![line(yacht.id, 3)]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValueOutOfRange);

    assert_eq!(fx.stock(p.id).await, 5);
    assert_eq!(fx.stock(yacht.id).await, 5);
    assert_eq!(fx.store.order_count().await, 0);
}

#[tokio::test]
async fn test_list_orders_across_users() {
    let fx = Fixture::new().await;
    let a = fx.product("A", 1000, 10).await;
    let other = fx.store.seed_user("other@example.com").await;

    assert!(order::list_orders(&fx.store).await.unwrap().is_empty());

    order::place_order(&fx.store, order_for(fx.user.id, vec![line(a.id, 1)]))
        .await
        .unwrap();
    order::place_order(&fx.store, order_for(other.id, vec![line(a.id, 2)]))
        .await
        .unwrap();

    let all = order::list_orders(&fx.store).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|d| d.order.user_id == other.id));
    assert!(all.iter().all(|d| d.items.len() == 1));
    assert!(all[0].order.created_at >= all[1].order.created_at);

    let mine = order::list_user_orders(&fx.store, fx.user.id).await.unwrap();
    assert_eq!(mine.len(), 1);
}
