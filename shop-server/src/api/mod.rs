//! API routes for shop-server
//!
//! Handlers decode the request, call one service operation and wrap the
//! result in [`ApiResponse`]. Errors render through `AppError`'s
//! `IntoResponse`, which uses the same envelope.

pub mod cart;
pub mod health;
pub mod order;
pub mod review;
pub mod stock;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use shared::error::{ApiResponse, AppError};
use tower_http::trace::TraceLayer;

use crate::error::ServiceResult;
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Wrap a service result in the response envelope
fn respond<T>(result: ServiceResult<T>) -> ApiResult<T> {
    result
        .map(|data| Json(ApiResponse::success(data)))
        .map_err(AppError::from)
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let carts = Router::new()
        .route("/api/carts", post(cart::create_cart))
        .route(
            "/api/carts/{id}",
            get(cart::get_cart).delete(cart::delete_cart),
        )
        .route("/api/carts/{id}/items", post(cart::add_item))
        .route(
            "/api/cart-items/{id}",
            patch(cart::update_item).delete(cart::remove_item),
        );

    let orders = Router::new()
        .route(
            "/api/orders",
            get(order::list_orders).post(order::place_order),
        )
        .route(
            "/api/orders/{id}",
            get(order::get_order).delete(order::delete_order),
        )
        .route("/api/orders/{id}/status", patch(order::update_status))
        .route(
            "/api/orders/{id}/payment-status",
            patch(order::update_payment_status),
        )
        .route("/api/users/{id}/orders", get(order::list_user_orders));

    let stock = Router::new().route(
        "/api/products/{id}/stock",
        get(stock::stock_level).put(stock::set_stock),
    );

    let reviews = Router::new()
        .route("/api/reviews", post(review::create_review))
        .route(
            "/api/reviews/{id}",
            get(review::get_review)
                .patch(review::update_review)
                .delete(review::delete_review),
        )
        .route(
            "/api/products/{id}/reviews",
            get(review::list_product_reviews),
        )
        .route("/api/reviews/{id}/votes", post(review::cast_vote))
        .route("/api/reviews/{id}/reconcile", post(review::reconcile));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(carts)
        .merge(orders)
        .merge(stock)
        .merge(reviews)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
