//! Subsite-aware permission checks.
//!
//! A principal may edit a page when the permission backend reports the
//! edit capability on the page's subsite, or on the main site (which
//! stands for every subsite).

use std::collections::BTreeSet;

use subsites_core::error::SubsitesResult;
use subsites_core::models::page::{Page, SubsiteOwned};
use subsites_core::repository::{SubsiteAccessLookup, SubsiteRepository};
use subsites_core::{Principal, SubsiteId, TenantContext};
use tracing::debug;

use crate::config::SubsitesConfig;

/// Subsites a principal holds a capability on.
#[derive(Debug, Clone, Default)]
struct AccessSet(BTreeSet<SubsiteId>);

impl AccessSet {
    fn allows(&self, subsite_id: SubsiteId) -> bool {
        self.0.contains(&SubsiteId::MAIN) || self.0.contains(&subsite_id)
    }
}

pub struct AccessEvaluator<A: SubsiteAccessLookup> {
    lookup: A,
    capability: String,
}

impl<A: SubsiteAccessLookup> AccessEvaluator<A> {
    pub fn new(lookup: A, config: &SubsitesConfig) -> Self {
        Self {
            lookup,
            capability: config.edit_capability.clone(),
        }
    }

    async fn access_set(&self, principal: &Principal) -> SubsitesResult<AccessSet> {
        let ids = self
            .lookup
            .accessible_subsites(principal, &self.capability)
            .await?;
        Ok(AccessSet(ids.into_iter().collect()))
    }

    /// The page's own subsite, else the context's.
    ///
    /// Falling back to the context only helps records that have not been
    /// written yet (bulk-edit forms). It is a convenience, not an
    /// enforcement point.
    fn effective_subsite(ctx: &TenantContext, page: &impl SubsiteOwned) -> Option<SubsiteId> {
        page.owning_subsite().or_else(|| ctx.resolve_subsite_id())
    }

    pub async fn can_edit(
        &self,
        ctx: &TenantContext,
        principal: &Principal,
        page: &impl SubsiteOwned,
    ) -> SubsitesResult<bool> {
        let Some(subsite_id) = Self::effective_subsite(ctx, page) else {
            debug!(principal = ?principal, "No resolvable subsite for access check; denying");
            return Ok(false);
        };

        let allowed = self.access_set(principal).await?.allows(subsite_id);
        debug!(
            principal = ?principal,
            subsite_id = %subsite_id,
            allowed,
            "Evaluated subsite edit access"
        );
        Ok(allowed)
    }

    pub async fn can_delete(
        &self,
        ctx: &TenantContext,
        principal: &Principal,
        page: &impl SubsiteOwned,
    ) -> SubsitesResult<bool> {
        self.can_edit(ctx, principal, page).await
    }

    pub async fn can_add_children(
        &self,
        ctx: &TenantContext,
        principal: &Principal,
        page: &impl SubsiteOwned,
    ) -> SubsitesResult<bool> {
        self.can_edit(ctx, principal, page).await
    }

    pub async fn can_publish(
        &self,
        ctx: &TenantContext,
        principal: &Principal,
        page: &impl SubsiteOwned,
    ) -> SubsitesResult<bool> {
        self.can_edit(ctx, principal, page).await
    }

    /// Whether `page_type` may be created in the current subsite.
    ///
    /// Blacklisted types are always refused; otherwise the principal needs
    /// edit access to the current subsite.
    pub async fn can_create<S: SubsiteRepository>(
        &self,
        ctx: &TenantContext,
        subsites: &S,
        principal: &Principal,
        page_type: &str,
    ) -> SubsitesResult<bool> {
        let Some(subsite_id) = ctx.resolve_subsite_id() else {
            return Ok(false);
        };

        if let Some(subsite) = ctx.current_subsite(subsites).await? {
            if subsite.is_page_type_blacklisted(page_type) {
                debug!(
                    subsite_id = %subsite.id,
                    page_type,
                    "Page type is blacklisted on subsite"
                );
                return Ok(false);
            }
        }

        Ok(self.access_set(principal).await?.allows(subsite_id))
    }

    /// Subsites `page` may be copied into by `principal`.
    ///
    /// Only pages of the main site or of a default subsite can be copied.
    /// The main site has no record, so it leads the list whenever the page
    /// lives elsewhere and the principal holds access to main.
    pub async fn copy_targets<S: SubsiteRepository>(
        &self,
        subsites: &S,
        principal: &Principal,
        page: &Page,
    ) -> SubsitesResult<Vec<SubsiteId>> {
        let all = subsites.list().await?;

        let source_is_template = page.is_main_site()
            || all
                .iter()
                .any(|s| s.id == page.subsite_id && s.is_default);
        if !source_is_template {
            return Ok(Vec::new());
        }

        let access = self.access_set(principal).await?;
        let main = (!page.is_main_site() && access.allows(SubsiteId::MAIN))
            .then_some(SubsiteId::MAIN);
        Ok(main
            .into_iter()
            .chain(
                all.into_iter()
                    .map(|s| s.id)
                    .filter(|id| *id != page.subsite_id && access.allows(*id)),
            )
            .collect())
    }
}
