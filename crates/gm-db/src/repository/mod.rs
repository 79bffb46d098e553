//! SurrealDB repository implementations.

mod account;
mod order;
mod product;

pub use account::SurrealAccountRepository;
pub use order::SurrealOrderRepository;
pub use product::SurrealProductRepository;
