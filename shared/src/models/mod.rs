//! Data models
//!
//! Shared between the server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, money is `Decimal` with 2 decimal places.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

// Re-exports
pub use cart::*;
pub use order::*;
pub use product::*;
pub use review::*;
pub use user::*;
