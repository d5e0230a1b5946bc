//! Vote Tally
//!
//! Reviews carry `helpful_count` / `not_helpful_count`, a cached aggregate of
//! their vote rows. Every vote locks the review row, reads the caller's
//! current vote, and applies one transition of the table below together with
//! the matching counter deltas:
//!
//! | from \ cast | helpful                  | not helpful              |
//! |-------------|--------------------------|--------------------------|
//! | NoVote      | Helpful, insert, h+1     | NotHelpful, insert, n+1  |
//! | Helpful     | NoVote, delete, h-1      | NotHelpful, update, h-1 n+1 |
//! | NotHelpful  | Helpful, update, h+1 n-1 | NoVote, delete, n-1      |
//!
//! The only other writer of vote rows is `delete_review`, which removes the
//! review and its votes together.

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ProductReview, ReviewCreate, ReviewDelete, ReviewDetail, ReviewUpdate, ReviewVote,
    ReviewVoteCast,
};
use shared::util::{now_millis, snowflake_id};

use super::ledger::product_not_found;
use crate::db::{Store, StoreError, UniqueKey};
use crate::error::{ServiceError, ServiceResult};
use crate::validation::{MAX_COMMENT_LEN, MAX_TITLE_LEN, require, validate_optional_text};

/// A user's vote on one review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    NoVote,
    Helpful,
    NotHelpful,
}

impl VoteState {
    pub fn of(vote: Option<&ReviewVote>) -> Self {
        match vote {
            None => VoteState::NoVote,
            Some(v) if v.is_helpful => VoteState::Helpful,
            Some(_) => VoteState::NotHelpful,
        }
    }
}

/// What happens to the vote row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: VoteState,
    pub action: VoteAction,
    pub helpful_delta: i32,
    pub not_helpful_delta: i32,
}

/// Casting the vote already held clears it; casting the opposite flips it.
pub fn transition(from: VoteState, is_helpful: bool) -> Transition {
    use VoteAction::*;
    use VoteState::*;

    let (next, action, helpful_delta, not_helpful_delta) = match (from, is_helpful) {
        (NoVote, true) => (Helpful, Insert, 1, 0),
        (NoVote, false) => (NotHelpful, Insert, 0, 1),
        (Helpful, true) => (NoVote, Delete, -1, 0),
        (Helpful, false) => (NotHelpful, Update, -1, 1),
        (NotHelpful, true) => (Helpful, Update, 1, -1),
        (NotHelpful, false) => (NoVote, Delete, 0, -1),
    };
    Transition {
        next,
        action,
        helpful_delta,
        not_helpful_delta,
    }
}

/// Result of a cast: the review with its new counters and the caller's vote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteOutcome {
    pub review: ProductReview,
    pub vote: VoteState,
}

fn review_not_found(review_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::ReviewNotFound,
        format!("Review {review_id} not found"),
    )
    .with_detail("review_id", review_id)
}

fn user_not_found(user_id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {user_id} not found"))
        .with_detail("user_id", user_id)
}

/// A review that does not exist and one written by someone else are
/// indistinguishable to the caller
fn review_not_owned(review_id: i64, user_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::ReviewNotFound,
        format!("Review {review_id} not found for user {user_id}"),
    )
    .with_detail("review_id", review_id)
}

fn validate_rating(rating: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::new(ErrorCode::ReviewInvalidRating).with_detail("rating", rating));
    }
    Ok(())
}

fn to_count(value: i64) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Corrupted(format!("vote count {value} overflows")))
}

pub async fn create_review(store: &dyn Store, data: ReviewCreate) -> ServiceResult<ProductReview> {
    let product_id = require(data.product_id, "product_id")?;
    let user_id = require(data.user_id, "user_id")?;
    let rating = require(data.rating, "rating")?;
    validate_rating(rating)?;
    validate_optional_text(&data.title, "title", MAX_TITLE_LEN)?;
    validate_optional_text(&data.comment, "comment", MAX_COMMENT_LEN)?;

    let mut tx = store.begin().await?;

    if tx.find_product(product_id).await?.is_none() {
        return Err(product_not_found(product_id).into());
    }
    if tx.find_user(user_id).await?.is_none() {
        return Err(user_not_found(user_id).into());
    }
    if let Some(order_id) = data.order_id {
        let owned = tx
            .find_order(order_id)
            .await?
            .is_some_and(|o| o.user_id == user_id);
        if !owned {
            return Err(AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {order_id} not found for user {user_id}"),
            )
            .with_detail("order_id", order_id)
            .into());
        }
    }

    let review = ProductReview {
        id: snowflake_id(),
        product_id,
        user_id,
        order_id: data.order_id,
        rating,
        title: data.title,
        comment: data.comment,
        is_verified: data.order_id.is_some(),
        helpful_count: 0,
        not_helpful_count: 0,
        created_at: now_millis(),
    };
    tx.insert_review(&review).await.map_err(|e| match e {
        StoreError::UniqueViolation(UniqueKey::ReviewAuthor) => ServiceError::from(
            AppError::new(ErrorCode::ReviewAlreadyExists)
                .with_detail("product_id", product_id)
                .with_detail("user_id", user_id),
        ),
        other => other.into(),
    })?;
    tx.commit().await?;

    tracing::info!(review_id = review.id, product_id, user_id, rating, "Review created");
    Ok(review)
}

pub async fn get_review(store: &dyn Store, review_id: i64) -> ServiceResult<ProductReview> {
    let mut tx = store.begin().await?;
    let review = tx
        .find_review(review_id)
        .await?
        .ok_or_else(|| review_not_found(review_id))?;
    Ok(review)
}

/// Reviews of one product with their vote rows, newest first
pub async fn list_product_reviews(
    store: &dyn Store,
    product_id: i64,
) -> ServiceResult<Vec<ReviewDetail>> {
    let mut tx = store.begin().await?;
    if tx.find_product(product_id).await?.is_none() {
        return Err(product_not_found(product_id).into());
    }
    let reviews = tx.reviews_by_product(product_id).await?;
    let mut details = Vec::with_capacity(reviews.len());
    for review in reviews {
        let votes = tx.review_votes(review.id).await?;
        details.push(ReviewDetail { review, votes });
    }
    Ok(details)
}

/// Edit rating, title or comment of the caller's own review. The vote
/// counters are never touched here.
pub async fn update_review(
    store: &dyn Store,
    review_id: i64,
    data: ReviewUpdate,
) -> ServiceResult<ProductReview> {
    let user_id = require(data.user_id, "user_id")?;
    let rating = require(data.rating, "rating")?;
    validate_rating(rating)?;
    validate_optional_text(&data.title, "title", MAX_TITLE_LEN)?;
    validate_optional_text(&data.comment, "comment", MAX_COMMENT_LEN)?;

    let mut tx = store.begin().await?;

    let current = tx
        .lock_review(review_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| review_not_owned(review_id, user_id))?;

    let title = data.title.or(current.title);
    let comment = data.comment.or(current.comment);
    let review = tx
        .update_review_content(review_id, rating, title.as_deref(), comment.as_deref())
        .await?
        .ok_or_else(|| review_not_found(review_id))?;
    tx.commit().await?;

    tracing::info!(review_id, user_id, rating, "Review updated");
    Ok(review)
}

/// Delete the caller's own review and every vote on it in one transaction
pub async fn delete_review(
    store: &dyn Store,
    review_id: i64,
    data: ReviewDelete,
) -> ServiceResult<ProductReview> {
    let user_id = require(data.user_id, "user_id")?;

    let mut tx = store.begin().await?;

    tx.lock_review(review_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| review_not_owned(review_id, user_id))?;
    let review = tx
        .delete_review(review_id)
        .await?
        .ok_or_else(|| review_not_found(review_id))?;
    tx.commit().await?;

    tracing::info!(
        review_id,
        user_id,
        helpful = review.helpful_count,
        not_helpful = review.not_helpful_count,
        "Review deleted"
    );
    Ok(review)
}

/// Toggle a helpful / not-helpful vote
pub async fn cast_vote(
    store: &dyn Store,
    review_id: i64,
    data: ReviewVoteCast,
) -> ServiceResult<VoteOutcome> {
    let user_id = require(data.user_id, "user_id")?;
    let is_helpful = require(data.is_helpful, "is_helpful")?;

    let mut tx = store.begin().await?;

    tx.lock_review(review_id)
        .await?
        .ok_or_else(|| review_not_found(review_id))?;
    if tx.find_user(user_id).await?.is_none() {
        return Err(user_not_found(user_id).into());
    }

    let existing = tx.find_vote(review_id, user_id).await?;
    let from = VoteState::of(existing.as_ref());
    let step = transition(from, is_helpful);

    match step.action {
        VoteAction::Insert => {
            let vote = ReviewVote {
                review_id,
                user_id,
                is_helpful,
                created_at: now_millis(),
            };
            tx.insert_vote(&vote).await.map_err(|e| match e {
                StoreError::UniqueViolation(UniqueKey::ReviewVote) => {
                    tracing::warn!(review_id, user_id, "Concurrent vote by the same user");
                    ServiceError::from(AppError::conflict("Vote changed concurrently, retry"))
                }
                other => other.into(),
            })?;
        }
        VoteAction::Update => tx.update_vote(review_id, user_id, is_helpful).await?,
        VoteAction::Delete => tx.delete_vote(review_id, user_id).await?,
    }

    let review = tx
        .adjust_review_counts(review_id, step.helpful_delta, step.not_helpful_delta)
        .await?;
    tx.commit().await?;

    tracing::info!(
        review_id,
        user_id,
        from = ?from,
        to = ?step.next,
        helpful = review.helpful_count,
        not_helpful = review.not_helpful_count,
        "Review vote cast"
    );
    Ok(VoteOutcome {
        review,
        vote: step.next,
    })
}

/// Recompute both counters from the vote rows
pub async fn reconcile(store: &dyn Store, review_id: i64) -> ServiceResult<ProductReview> {
    let mut tx = store.begin().await?;

    let before = tx
        .lock_review(review_id)
        .await?
        .ok_or_else(|| review_not_found(review_id))?;
    let counts = tx.count_votes(review_id).await?;
    let review = tx
        .write_review_counts(review_id, to_count(counts.helpful)?, to_count(counts.not_helpful)?)
        .await?;
    tx.commit().await?;

    if before.helpful_count != review.helpful_count
        || before.not_helpful_count != review.not_helpful_count
    {
        tracing::warn!(
            review_id,
            helpful_before = before.helpful_count,
            not_helpful_before = before.not_helpful_count,
            helpful = review.helpful_count,
            not_helpful = review.not_helpful_count,
            "Review counters repaired"
        );
    }
    Ok(review)
}
