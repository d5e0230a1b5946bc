//! shop-server: storefront inventory, order and review-vote core
//!
//! - [`service`]: stock ledger, cart mutator, order placer, vote tally
//! - [`db`]: the transactional storage seam and its backends
//! - [`api`]: thin axum adapter over the service operations

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod service;
pub mod state;
pub mod validation;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
