//! Core storefront operations
//!
//! Each public operation validates its input, opens one store transaction,
//! and commits it only when every step succeeded. An early `?` drops the
//! transaction, which rolls it back.
//!
//! - [`ledger`]: authoritative stock levels
//! - [`cart`]: cart lines, priced against the current product price
//! - [`order`]: atomic order placement with stock debit
//! - [`vote`]: reviews and their helpful / not-helpful tally

pub mod cart;
pub mod ledger;
pub mod order;
pub mod vote;
