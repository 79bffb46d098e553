//! Database-specific error types and conversions.

use gm_core::error::GmError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique index violated on {entity}")]
    Duplicate { entity: String },
}

impl DbError {
    /// Classify a failed statement. SurrealDB reports unique index
    /// violations as "Database index `…` already contains …".
    pub(crate) fn from_statement(entity: &str, message: String) -> Self {
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<DbError> for GmError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GmError::NotFound { entity, id },
            DbError::Duplicate { entity } => GmError::AlreadyExists { entity },
            other => GmError::StoreUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_violation_is_duplicate() {
        let err = DbError::from_statement(
            "account",
            "Database index `idx_account_vendor_code` already contains 'K7P2QX', \
             with record `account:abc`"
                .into(),
        );
        assert!(matches!(err, DbError::Duplicate { .. }));
        assert!(matches!(
            GmError::from(err),
            GmError::AlreadyExists { entity } if entity == "account"
        ));
    }

    #[test]
    fn other_statement_errors_are_store_faults() {
        let err = DbError::from_statement("account", "Found 'x' for field `role`".into());
        assert!(GmError::from(err).is_retryable());
    }

    #[test]
    fn not_found_passes_through() {
        let err: GmError = DbError::not_found("product", "42").into();
        assert!(matches!(err, GmError::NotFound { id, .. } if id == "42"));
    }
}
