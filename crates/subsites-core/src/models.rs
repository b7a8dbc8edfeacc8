//! Domain models for subsites.
//!
//! Pages and everything hanging off them carry a [`subsite::SubsiteId`];
//! the nil id is the main site.

pub mod cross_link;
pub mod page;
pub mod principal;
pub mod related;
pub mod site_config;
pub mod subsite;
