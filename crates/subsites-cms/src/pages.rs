//! Scoped page reads and the write-time subsite binder.

use subsites_core::error::{SubsitesError, SubsitesResult};
use subsites_core::models::page::{NewPage, Page, Stage, UpdatePage};
use subsites_core::repository::{PageRepository, SubsiteRepository};
use subsites_core::{PageQuery, QueryPipeline, TenantContext};
use tracing::debug;
use uuid::Uuid;

use crate::error::CmsError;

/// Assign the current subsite to a page that has none yet. An explicit
/// assignment, main site included, is never overwritten.
pub fn bind_subsite(ctx: &TenantContext, page: &mut NewPage) {
    if page.subsite_id.is_none() {
        let subsite_id = ctx.current_subsite_id();
        debug!(
            subsite_id = %subsite_id,
            url_segment = %page.url_segment,
            "Binding new page to current subsite"
        );
        page.subsite_id = Some(subsite_id);
    }
}

/// Page reads and writes for one request.
///
/// Every read goes through the query pipeline, so results are scoped to
/// the context's subsite unless the query or the context opts out.
pub struct PageService<P: PageRepository, S: SubsiteRepository> {
    pages: P,
    subsites: S,
    pipeline: QueryPipeline,
}

impl<P: PageRepository, S: SubsiteRepository> PageService<P, S> {
    pub fn new(pages: P, subsites: S) -> Self {
        Self::with_pipeline(pages, subsites, QueryPipeline::scoped())
    }

    pub fn with_pipeline(pages: P, subsites: S, pipeline: QueryPipeline) -> Self {
        Self {
            pages,
            subsites,
            pipeline,
        }
    }

    pub fn repository(&self) -> &P {
        &self.pages
    }

    pub fn pipeline(&self) -> &QueryPipeline {
        &self.pipeline
    }

    pub async fn find(&self, ctx: &TenantContext, query: PageQuery) -> SubsitesResult<Vec<Page>> {
        let query = self.pipeline.prepare(ctx, query);
        self.pages.select(&query).await
    }

    /// Identity lookups are not scoped.
    pub async fn get(&self, ctx: &TenantContext, stage: Stage, id: Uuid) -> SubsitesResult<Page> {
        self.find(ctx, PageQuery::new(stage).by_id(id).limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SubsitesError::NotFound {
                entity: stage.table().into(),
                id: id.to_string(),
            })
    }

    pub async fn get_by_url_segment(
        &self,
        ctx: &TenantContext,
        stage: Stage,
        segment: &str,
    ) -> SubsitesResult<Option<Page>> {
        let pages = self
            .find(ctx, PageQuery::new(stage).url_segment(segment).limit(1))
            .await?;
        Ok(pages.into_iter().next())
    }

    pub async fn children(
        &self,
        ctx: &TenantContext,
        parent_id: Option<Uuid>,
    ) -> SubsitesResult<Vec<Page>> {
        self.find(ctx, PageQuery::draft().parent(parent_id)).await
    }

    /// Bind the page to the current subsite if unset, refuse page types
    /// the target subsite blacklists, then persist the draft.
    pub async fn create(&self, ctx: &TenantContext, mut input: NewPage) -> SubsitesResult<Page> {
        bind_subsite(ctx, &mut input);

        if let Some(subsite_id) = input.subsite_id.filter(|id| !id.is_main()) {
            match self.subsites.get_by_id(subsite_id).await {
                Ok(subsite) if subsite.is_page_type_blacklisted(&input.page_type) => {
                    return Err(CmsError::PageTypeNotAllowed {
                        page_type: input.page_type,
                        subsite_id,
                    }
                    .into());
                }
                Ok(_) | Err(SubsitesError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        self.pages.create(input).await
    }

    pub async fn update(&self, id: Uuid, input: UpdatePage) -> SubsitesResult<Page> {
        self.pages.update(id, input).await
    }

    pub async fn publish(&self, id: Uuid) -> SubsitesResult<Page> {
        self.pages.publish(id).await
    }

    pub async fn delete(&self, id: Uuid) -> SubsitesResult<()> {
        self.pages.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use subsites_core::SubsiteId;

    use super::*;

    #[test]
    fn binds_unset_subsite_from_context() {
        let subsite = SubsiteId::new_v4();
        let ctx = TenantContext::for_subsite(subsite);
        let mut page = NewPage::new("Page", "Home", "home");

        bind_subsite(&ctx, &mut page);
        assert_eq!(page.subsite_id, Some(subsite));
    }

    #[test]
    fn keeps_explicit_subsite_including_main() {
        let ctx = TenantContext::for_subsite(SubsiteId::new_v4());

        let mut page = NewPage::new("Page", "Home", "home").with_subsite(SubsiteId::MAIN);
        bind_subsite(&ctx, &mut page);
        assert_eq!(page.subsite_id, Some(SubsiteId::MAIN));
    }

    #[test]
    fn forced_subsite_wins_when_binding() {
        let forced = SubsiteId::new_v4();
        let mut ctx = TenantContext::for_subsite(SubsiteId::new_v4());
        let guard = ctx.forced_to(forced);

        let mut page = NewPage::new("Page", "Home", "home");
        bind_subsite(&guard, &mut page);
        assert_eq!(page.subsite_id, Some(forced));
    }
}
