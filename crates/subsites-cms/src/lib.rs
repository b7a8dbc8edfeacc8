//! Subsites CMS: the page services that sit on top of the scoping core.
//!
//! Every service is generic over the `subsites-core` repository traits
//! and takes the request's [`TenantContext`](subsites_core::TenantContext)
//! explicitly.

pub mod access;
pub mod config;
pub mod duplication;
pub mod error;
pub mod link_tracking;
pub mod pages;
pub mod presentation;
pub mod site_config;

pub use access::AccessEvaluator;
pub use config::SubsitesConfig;
pub use duplication::{DuplicationEngine, DuplicationHook};
pub use error::CmsError;
pub use link_tracking::{LinkSyncReport, LinkTracker};
pub use pages::PageService;
pub use presentation::Presenter;
pub use site_config::SiteConfigResolver;
