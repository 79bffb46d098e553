//! Domain models for GreenMarket.
//!
//! These are the core types shared across all crates.

pub mod account;
pub mod cart;
pub mod district;
pub mod order;
pub mod product;

/// Largest amount (FCFA) a price or order total may reach. Amounts are
/// stored as signed 64-bit integers.
pub const MAX_AMOUNT: u64 = i64::MAX as u64;
