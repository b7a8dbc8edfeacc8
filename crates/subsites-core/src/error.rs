//! Error types shared by every subsites crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubsitesError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Rejected by {hook} hook: {reason}")]
    HookRejected { hook: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SubsitesResult<T> = Result<T, SubsitesError>;
