//! GreenMarket Core: domain models, error taxonomy and the repository
//! traits that form the record-store boundary.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{GmError, GmResult};
