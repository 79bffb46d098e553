//! Marketplace error types.

use gm_core::error::GmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("vendor code must be 6 letters or digits")]
    MalformedCode,

    #[error("code not found or expired")]
    CodeNotFound,

    #[error("code not found or expired")]
    VendorInactive,

    #[error("could not mint a unique vendor code after {0} attempts")]
    CodeSpaceExhausted(u32),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("the cart is empty")]
    EmptyCart,

    #[error("unknown delivery district: {0}")]
    UnknownDistrict(String),

    #[error("{0} is not available for purchase")]
    ProductUnavailable(String),

    #[error("quantity of {0} must be at least 1")]
    InvalidQuantity(String),

    #[error("order total is too large")]
    AmountOutOfRange,

    #[error("order cannot move from {from} to {to}")]
    InvalidOrderTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("only administrators may {0}")]
    AdminOnly(&'static str),

    #[error("only a super-admin may {0}")]
    SuperAdminOnly(&'static str),

    #[error("unknown caller")]
    UnknownCaller,
}

impl From<MarketError> for GmError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::CodeNotFound => GmError::CodeNotFound,
            MarketError::VendorInactive => GmError::VendorInactive,
            MarketError::MalformedCode
            | MarketError::MissingField(_)
            | MarketError::EmptyCart
            | MarketError::UnknownDistrict(_)
            | MarketError::ProductUnavailable(_)
            | MarketError::InvalidQuantity(_)
            | MarketError::AmountOutOfRange => GmError::Validation {
                message: err.to_string(),
            },
            MarketError::CodeSpaceExhausted(_) | MarketError::InvalidOrderTransition { .. } => {
                GmError::StateConflict {
                    message: err.to_string(),
                }
            }
            MarketError::AdminOnly(_)
            | MarketError::SuperAdminOnly(_)
            | MarketError::UnknownCaller => GmError::PermissionDenied {
                reason: err.to_string(),
            },
        }
    }
}
