//! Error types for the GreenMarket system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GmError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("State conflict: {message}")]
    StateConflict { message: String },

    #[error("Vendor code not found")]
    CodeNotFound,

    #[error("Vendor is not active")]
    VendorInactive,

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type GmResult<T> = Result<T, GmError>;

impl GmError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::StateConflict {
            message: message.into(),
        }
    }

    /// Only store faults may be retried, and only by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Text suitable for showing to the end user.
    ///
    /// Business-rule failures carry their own actionable message; store
    /// faults collapse to a generic retry-later text so that internals
    /// never leak into the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => format!("{entity} not found"),
            Self::AlreadyExists { entity } => format!("{entity} already exists"),
            Self::Validation { message } => message.clone(),
            Self::PermissionDenied { .. } => "you are not allowed to perform this action".into(),
            Self::StateConflict { message } => message.clone(),
            Self::CodeNotFound | Self::VendorInactive => "code not found or expired".into(),
            Self::StoreUnavailable(_) => "service temporarily unavailable, please retry later".into(),
        }
    }
}
