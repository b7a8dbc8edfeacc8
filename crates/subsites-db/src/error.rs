//! Database-specific error types and conversions.

use subsites_core::error::SubsitesError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Stored value could not be decoded: {0}")]
    Decode(String),

    #[error("Query cannot be rendered: {0}")]
    UnsupportedQuery(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for SubsitesError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SubsitesError::NotFound { entity, id },
            DbError::UnsupportedQuery(message) => SubsitesError::Validation { message },
            other => SubsitesError::Database(other.to_string()),
        }
    }
}
