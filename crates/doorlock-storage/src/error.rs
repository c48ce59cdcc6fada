use doorlock_core::CardId;
use thiserror::Error;

/// Storage-specific error types for the doorlock controller.
///
/// These errors represent failures in database operations and violations of
/// the credential table's invariants.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// A credential with this id is already enrolled
    #[error("Duplicate credential id: {0}")]
    DuplicateId(CardId),

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub(crate) fn card_not_found(id: CardId) -> Self {
        StorageError::NotFound {
            entity_type: "Credential".to_string(),
            field: "card_id".to_string(),
            value: id.to_string(),
        }
    }

    /// Returns `true` for a duplicate enrollment.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StorageError::DuplicateId(_))
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
