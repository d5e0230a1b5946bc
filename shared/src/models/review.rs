//! Review Model

use serde::{Deserialize, Serialize};

/// Product review
///
/// `helpful_count` / `not_helpful_count` are a cached aggregate of the
/// review's vote rows; only the vote tally writes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductReview {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_verified: bool,
    pub helpful_count: i32,
    pub not_helpful_count: i32,
    pub created_at: i64,
}

/// One user's vote on one review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReviewVote {
    pub review_id: i64,
    pub user_id: i64,
    pub is_helpful: bool,
    pub created_at: i64,
}

/// Create review payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewCreate {
    pub product_id: Option<i64>,
    pub user_id: Option<i64>,
    pub order_id: Option<i64>,
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

/// Cast vote payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewVoteCast {
    pub user_id: Option<i64>,
    pub is_helpful: Option<bool>,
}

/// Review with its vote rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewDetail {
    #[serde(flatten)]
    pub review: ProductReview,
    pub votes: Vec<ReviewVote>,
}

/// Update review payload (author only). Absent `title` / `comment` keep
/// their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub user_id: Option<i64>,
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

/// Delete review payload (author only)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewDelete {
    pub user_id: Option<i64>,
}
