//! Database-specific error types and conversions.

use keygate_core::error::KeygateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl From<DbError> for KeygateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => KeygateError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => KeygateError::AlreadyExists { entity },
            other => KeygateError::Database(other.to_string()),
        }
    }
}
