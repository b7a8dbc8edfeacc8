//! Subsites database: SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Rendering of scoped page queries to SurrealQL
//! - SurrealDB implementations of the `subsites-core` repository traits
//! - Error types ([`DbError`])

mod connection;
mod error;
mod query;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
