//! Copying pages into another subsite.
//!
//! [`DuplicationEngine::prepare_duplicate`] builds the unsaved copy;
//! [`DuplicationEngine::duplicate_to_subsite`] persists it, copies the
//! configured relations and runs the registered hooks around the write.

use subsites_core::error::{SubsitesError, SubsitesResult};
use subsites_core::models::page::{NewPage, Page, Stage};
use subsites_core::repository::{PageRepository, RelatedRecordRepository};
use subsites_core::{PageQuery, QueryPipeline, SubsiteId, TenantContext};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SubsitesConfig;
use crate::error::CmsError;

/// Extension point around a duplicate's write.
///
/// `before_write` runs on the unsaved copy and may adjust it or refuse
/// the duplication; `after_write` sees the persisted copy. Hooks run in
/// registration order.
pub trait DuplicationHook: Send + Sync {
    fn name(&self) -> &'static str;

    fn before_write(&self, _source: &Page, _copy: &mut NewPage) -> Result<(), CmsError> {
        Ok(())
    }

    fn after_write(&self, _source: &Page, _copy: &Page) -> Result<(), CmsError> {
        Ok(())
    }
}

pub struct DuplicationEngine<P: PageRepository, R: RelatedRecordRepository> {
    pages: P,
    related: R,
    pipeline: QueryPipeline,
    config: SubsitesConfig,
    hooks: Vec<Box<dyn DuplicationHook>>,
}

impl<P: PageRepository, R: RelatedRecordRepository> DuplicationEngine<P, R> {
    pub fn new(pages: P, related: R, config: SubsitesConfig) -> Self {
        Self {
            pages,
            related,
            pipeline: QueryPipeline::scoped(),
            config,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl DuplicationHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Build an unsaved copy of `source` for `target`.
    ///
    /// `None` or the main site keeps the caller's current subsite. Any
    /// other target is forced for the duration of the call, so it wins
    /// over a subsite the caller has forced. The copy's parent is the page
    /// in the target subsite with the same URL segment as the source's
    /// parent; without one it is placed at the top level for an editor to
    /// move.
    pub async fn prepare_duplicate(
        &self,
        ctx: &mut TenantContext,
        source: &Page,
        target: Option<SubsiteId>,
    ) -> SubsitesResult<NewPage> {
        let scope = match target {
            Some(id) if !id.is_main() => ctx.forced_to(id),
            _ => ctx.scope(),
        };
        let subsite_id = scope.current_subsite_id();

        let mut copy = source.duplicate();
        copy.needs_publication_check = true;
        copy.subsite_id = Some(subsite_id);
        copy.master_page_id = Some(source.id);
        copy.parent_id = match source.parent_id {
            Some(parent_id) => self.matching_parent(&scope, parent_id, subsite_id).await?,
            None => None,
        };

        debug!(
            source_id = %source.id,
            subsite_id = %subsite_id,
            parent_id = ?copy.parent_id,
            "Prepared page duplicate"
        );

        Ok(copy)
    }

    async fn matching_parent(
        &self,
        ctx: &TenantContext,
        source_parent_id: Uuid,
        subsite_id: SubsiteId,
    ) -> SubsitesResult<Option<Uuid>> {
        let source_parent = match self.pages.get_by_id(Stage::Draft, source_parent_id).await {
            Ok(parent) => parent,
            Err(SubsitesError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let query = self.pipeline.prepare(
            ctx,
            PageQuery::draft()
                .url_segment(source_parent.url_segment)
                .in_subsites(vec![subsite_id])
                .limit(1),
        );
        let found = self.pages.select(&query).await?.into_iter().next();
        if found.is_none() {
            debug!(
                source_parent_id = %source_parent_id,
                subsite_id = %subsite_id,
                "No matching parent in target subsite; placing at top level"
            );
        }

        Ok(found.map(|p| p.id))
    }

    /// Persist a copy of `source` in `target` along with its configured
    /// relations. Relations are copied one level deep.
    pub async fn duplicate_to_subsite(
        &self,
        ctx: &mut TenantContext,
        source: &Page,
        target: Option<SubsiteId>,
    ) -> SubsitesResult<Page> {
        let mut copy = self.prepare_duplicate(ctx, source, target).await?;

        for hook in &self.hooks {
            hook.before_write(source, &mut copy)?;
        }

        let page = self.pages.create(copy).await?;

        let mut copied = 0usize;
        for relation in self.config.relations_to_duplicate(&source.page_type) {
            let records = self.related.list_for_owner(source.id, relation).await?;
            for record in &records {
                self.related.create(record.duplicate_for(page.id)).await?;
                copied += 1;
            }
        }

        for hook in &self.hooks {
            hook.after_write(source, &page)?;
        }

        info!(
            source_id = %source.id,
            page_id = %page.id,
            subsite_id = %page.subsite_id,
            related_records = copied,
            "Duplicated page to subsite"
        );

        Ok(page)
    }
}
