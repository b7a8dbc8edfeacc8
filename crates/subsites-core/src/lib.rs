//! Subsites core: the multi-subsite data-scoping model.
//!
//! This crate provides:
//! - Domain models ([`models`]) for pages, subsites, site configs,
//!   cross-subsite links and page-owned related records
//! - Repository contracts ([`repository`]) that persistence and
//!   permission backends implement
//! - The request-scoped [`TenantContext`] with restore-on-drop guards
//! - The page query builder and the subsite scoping stage ([`query`])

pub mod context;
pub mod error;
pub mod models;
pub mod query;
pub mod repository;

pub use context::{ContextGuard, CurrentSubsite, TenantContext};
pub use error::{SubsitesError, SubsitesResult};
pub use models::principal::Principal;
pub use models::subsite::SubsiteId;
pub use query::{PageQuery, Predicate, QueryPipeline, QueryStage, SubsiteScopeFilter};
