//! GreenMarket marketplace services: vendor lifecycle, access codes,
//! catalog moderation, checkout and admin notifications.
//!
//! Every service is generic over the repository traits in `gm-core`
//! and never touches the database directly.

pub mod access_code;
pub mod accounts;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
mod guard;
pub mod notification;
pub mod vendor;

pub use access_code::{
    AccessCodeAuthorizer, CodeGenerator, RandomCodeGenerator, UnlockedCatalog, VendorAccess,
};
pub use accounts::AccountService;
pub use catalog::{CatalogService, ProductDraft};
pub use checkout::{CheckoutPhase, CheckoutRequest, CheckoutService};
pub use config::MarketConfig;
pub use error::MarketError;
pub use notification::NotificationService;
pub use vendor::VendorService;
