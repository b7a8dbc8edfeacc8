//! Page queries and the scoping stage every page read passes through.
//!
//! A [`PageQuery`] is an inspectable description of a read against the
//! page tables: its source tables, its predicates and per-query
//! parameters. Backends render it; a [`QueryPipeline`] rewrites it first.
//! The [`SubsiteScopeFilter`] stage appends the current subsite predicate
//! unless the query opts out, targets a page by identity, or filtering is
//! disabled on the context.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::TenantContext;
use crate::models::page::{Page, Stage, is_page_table};
use crate::models::subsite::SubsiteId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    IdEq(Uuid),
    /// Restrict `table`'s rows to the given subsites.
    SubsiteIn { table: String, ids: Vec<SubsiteId> },
    UrlSegmentEq(String),
    /// `None` matches top-level pages.
    ParentEq(Option<Uuid>),
    PageTypeEq(String),
}

impl Predicate {
    pub fn matches(&self, page: &Page) -> bool {
        match self {
            Predicate::IdEq(id) => page.id == *id,
            Predicate::SubsiteIn { ids, .. } => ids.contains(&page.subsite_id),
            Predicate::UrlSegmentEq(segment) => page.url_segment == *segment,
            Predicate::ParentEq(parent) => page.parent_id == *parent,
            Predicate::PageTypeEq(page_type) => page.page_type == *page_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    from: Vec<String>,
    predicates: Vec<Predicate>,
    /// `Some(false)` opts this query out of subsite scoping.
    subsite_filter: Option<bool>,
    limit: Option<u64>,
}

impl PageQuery {
    pub fn new(stage: Stage) -> Self {
        Self {
            from: vec![stage.table().to_string()],
            predicates: Vec::new(),
            subsite_filter: None,
            limit: None,
        }
    }

    pub fn draft() -> Self {
        Self::new(Stage::Draft)
    }

    pub fn live() -> Self {
        Self::new(Stage::Live)
    }

    /// Add a further source table after the primary one.
    pub fn join(mut self, table: impl Into<String>) -> Self {
        self.from.push(table.into());
        self
    }

    /// Source tables; the first is the primary entity table.
    pub fn tables(&self) -> &[String] {
        &self.from
    }

    pub fn stage(&self) -> Stage {
        match self.from.first().map(String::as_str) {
            Some(table) if table == Stage::Live.table() => Stage::Live,
            _ => Stage::Draft,
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn add_where(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.add_where(predicate);
        self
    }

    pub fn by_id(self, id: Uuid) -> Self {
        self.filter(Predicate::IdEq(id))
    }

    pub fn url_segment(self, segment: impl Into<String>) -> Self {
        self.filter(Predicate::UrlSegmentEq(segment.into()))
    }

    pub fn parent(self, parent_id: Option<Uuid>) -> Self {
        self.filter(Predicate::ParentEq(parent_id))
    }

    pub fn page_type(self, page_type: impl Into<String>) -> Self {
        self.filter(Predicate::PageTypeEq(page_type.into()))
    }

    /// Explicit subsite restriction on the primary table.
    pub fn in_subsites(self, ids: Vec<SubsiteId>) -> Self {
        let table = self.from.first().cloned().unwrap_or_default();
        self.filter(Predicate::SubsiteIn { table, ids })
    }

    pub fn without_subsite_filter(mut self) -> Self {
        self.subsite_filter = Some(false);
        self
    }

    pub fn subsite_filter_param(&self) -> Option<bool> {
        self.subsite_filter
    }

    pub fn filters_on_id(&self) -> bool {
        self.predicates
            .iter()
            .any(|p| matches!(p, Predicate::IdEq(_)))
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Evaluate the predicates against a page row.
    pub fn matches(&self, page: &Page) -> bool {
        self.predicates.iter().all(|p| p.matches(page))
    }
}

/// One rewriting step applied to every outgoing page query.
pub trait QueryStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Must only read `ctx` and only touch `query`.
    fn apply(&self, ctx: &TenantContext, query: &mut PageQuery);
}

/// Ordered list of [`QueryStage`]s.
#[derive(Default)]
pub struct QueryPipeline {
    stages: Vec<Box<dyn QueryStage>>,
}

impl QueryPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline with the subsite scoping stage installed.
    pub fn scoped() -> Self {
        Self::new().with_stage(SubsiteScopeFilter)
    }

    pub fn with_stage(mut self, stage: impl QueryStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn prepare(&self, ctx: &TenantContext, mut query: PageQuery) -> PageQuery {
        for stage in &self.stages {
            stage.apply(ctx, &mut query);
        }
        query
    }
}

/// Restricts page reads to the current (or forced) subsite.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsiteScopeFilter;

impl QueryStage for SubsiteScopeFilter {
    fn name(&self) -> &'static str {
        "subsite_scope"
    }

    fn apply(&self, ctx: &TenantContext, query: &mut PageQuery) {
        if ctx.is_filter_disabled() || query.subsite_filter_param() == Some(false) {
            return;
        }
        // Reads by identity are allowed to cross subsites.
        if query.filters_on_id() {
            return;
        }

        // Only the primary table is scoped; joined tables are left alone.
        let table = match query.tables().first() {
            Some(table) if is_page_table(table) => table.clone(),
            _ => return,
        };

        let Some(subsite_id) = ctx.resolve_subsite_id() else {
            warn!(
                table = %table,
                selected = ?ctx.selected(),
                "Current subsite is indeterminate; page query left unscoped"
            );
            return;
        };

        let predicate = Predicate::SubsiteIn {
            table,
            ids: vec![subsite_id],
        };
        if !query.predicates().contains(&predicate) {
            debug!(subsite_id = %subsite_id, "Scoping page query to subsite");
            query.add_where(predicate);
        }
    }
}
