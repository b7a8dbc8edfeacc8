//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Page reads go through
//! [`PageRepository::select`] with an already-prepared [`PageQuery`];
//! scoping to the current subsite happens before that call, in the
//! query pipeline, never inside a backend.

use uuid::Uuid;

use crate::error::SubsitesResult;
use crate::models::{
    cross_link::CrossSubsiteLink,
    page::{NewPage, Page, Stage, UpdatePage},
    principal::Principal,
    related::{CreateRelatedRecord, RelatedRecord},
    site_config::{CreateSiteConfig, SiteConfig},
    subsite::{CreateSubsite, DomainBinding, Subsite, SubsiteDomain, SubsiteId, UpdateSubsite},
};
use crate::query::PageQuery;

// ---------------------------------------------------------------------------
// Subsites (global scope)
// ---------------------------------------------------------------------------

pub trait SubsiteRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSubsite,
    ) -> impl Future<Output = SubsitesResult<Subsite>> + Send;
    fn get_by_id(&self, id: SubsiteId) -> impl Future<Output = SubsitesResult<Subsite>> + Send;
    fn update(
        &self,
        id: SubsiteId,
        input: UpdateSubsite,
    ) -> impl Future<Output = SubsitesResult<Subsite>> + Send;
    fn delete(&self, id: SubsiteId) -> impl Future<Output = SubsitesResult<()>> + Send;
    fn list(&self) -> impl Future<Output = SubsitesResult<Vec<Subsite>>> + Send;

    /// Bind another domain to a subsite.
    fn add_domain(
        &self,
        id: SubsiteId,
        domain: SubsiteDomain,
    ) -> impl Future<Output = SubsitesResult<()>> + Send;

    /// Every domain binding across all subsites.
    fn domain_bindings(&self) -> impl Future<Output = SubsitesResult<Vec<DomainBinding>>> + Send;

    /// Resolve a host name to its subsite; [`SubsiteId::MAIN`] if unknown.
    fn subsite_id_for_domain(
        &self,
        host: &str,
    ) -> impl Future<Output = SubsitesResult<SubsiteId>> + Send;
}

// ---------------------------------------------------------------------------
// Pages (subsite scoped through the query pipeline)
// ---------------------------------------------------------------------------

pub trait PageRepository: Send + Sync {
    /// Persist a draft page. The subsite must already be bound.
    fn create(&self, input: NewPage) -> impl Future<Output = SubsitesResult<Page>> + Send;
    fn get_by_id(
        &self,
        stage: Stage,
        id: Uuid,
    ) -> impl Future<Output = SubsitesResult<Page>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePage,
    ) -> impl Future<Output = SubsitesResult<Page>> + Send;
    /// Remove the page from both stages, along with its link tracking.
    fn delete(&self, id: Uuid) -> impl Future<Output = SubsitesResult<()>> + Send;
    /// Run a prepared query as-is.
    fn select(&self, query: &PageQuery) -> impl Future<Output = SubsitesResult<Vec<Page>>> + Send;
    /// Copy the draft row into the live stage.
    fn publish(&self, id: Uuid) -> impl Future<Output = SubsitesResult<Page>> + Send;
}

pub trait CrossLinkRepository: Send + Sync {
    /// Replace every tracked link from `source_id` with links to `target_ids`.
    fn replace_links(
        &self,
        source_id: Uuid,
        field_name: &str,
        target_ids: &[Uuid],
    ) -> impl Future<Output = SubsitesResult<()>> + Send;
    fn links_from(
        &self,
        source_id: Uuid,
    ) -> impl Future<Output = SubsitesResult<Vec<CrossSubsiteLink>>> + Send;
}

pub trait RelatedRecordRepository: Send + Sync {
    fn create(
        &self,
        input: CreateRelatedRecord,
    ) -> impl Future<Output = SubsitesResult<RelatedRecord>> + Send;
    fn list_for_owner(
        &self,
        owner_id: Uuid,
        relation: &str,
    ) -> impl Future<Output = SubsitesResult<Vec<RelatedRecord>>> + Send;
}

// ---------------------------------------------------------------------------
// Per-subsite configuration
// ---------------------------------------------------------------------------

pub trait SiteConfigRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSiteConfig,
    ) -> impl Future<Output = SubsitesResult<SiteConfig>> + Send;
    fn get_for_subsite(
        &self,
        subsite_id: SubsiteId,
    ) -> impl Future<Output = SubsitesResult<Option<SiteConfig>>> + Send;
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

pub trait SubsiteAccessLookup: Send + Sync {
    /// Subsites on which `principal` holds `capability`. A result
    /// containing [`SubsiteId::MAIN`] means access to every subsite.
    fn accessible_subsites(
        &self,
        principal: &Principal,
        capability: &str,
    ) -> impl Future<Output = SubsitesResult<Vec<SubsiteId>>> + Send;
}
