use axum::Json;
use axum::extract::{Path, State};
use shared::models::{
    ProductReview, ReviewCreate, ReviewDelete, ReviewDetail, ReviewUpdate, ReviewVoteCast,
};

use super::{ApiResult, respond};
use crate::service::vote::{self, VoteOutcome};
use crate::state::AppState;

pub async fn create_review(
    State(state): State<AppState>,
    Json(data): Json<ReviewCreate>,
) -> ApiResult<ProductReview> {
    respond(vote::create_review(state.store(), data).await)
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ProductReview> {
    respond(vote::get_review(state.store(), id).await)
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<ReviewUpdate>,
) -> ApiResult<ProductReview> {
    respond(vote::update_review(state.store(), id, data).await)
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<ReviewDelete>,
) -> ApiResult<ProductReview> {
    respond(vote::delete_review(state.store(), id, data).await)
}

pub async fn list_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> ApiResult<Vec<ReviewDetail>> {
    respond(vote::list_product_reviews(state.store(), product_id).await)
}

pub async fn cast_vote(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
    Json(data): Json<ReviewVoteCast>,
) -> ApiResult<VoteOutcome> {
    respond(vote::cast_vote(state.store(), review_id, data).await)
}

/// Recompute the cached counters from the vote rows
pub async fn reconcile(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
) -> ApiResult<ProductReview> {
    respond(vote::reconcile(state.store(), review_id).await)
}
