//! Rendering of [`PageQuery`] values to SurrealQL.
//!
//! Values are always bound as parameters. Table names are checked
//! against the known page tables before being embedded.

use subsites_core::models::page::is_page_table;
use subsites_core::query::{PageQuery, Predicate};

use crate::error::DbError;

const PARAMS: [&str; 12] = [
    "p0", "p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8", "p9", "p10", "p11",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Binding {
    Str(String),
    Strs(Vec<String>),
    Limit(u64),
}

#[derive(Debug)]
pub(crate) struct RenderedQuery {
    pub sql: String,
    pub bindings: Vec<(&'static str, Binding)>,
}

pub(crate) fn render_select(query: &PageQuery) -> Result<RenderedQuery, DbError> {
    let table = match query.tables() {
        [table] if is_page_table(table) => table.as_str(),
        [table] => {
            return Err(DbError::UnsupportedQuery(format!(
                "'{table}' is not a page table"
            )));
        }
        [] => return Err(DbError::UnsupportedQuery("no source table".into())),
        _ => {
            return Err(DbError::UnsupportedQuery(
                "multiple source tables are not supported".into(),
            ));
        }
    };

    if query.predicates().len() + 1 > PARAMS.len() {
        return Err(DbError::UnsupportedQuery(format!(
            "at most {} predicates are supported",
            PARAMS.len() - 1
        )));
    }

    let mut clauses = Vec::new();
    let mut bindings = Vec::new();

    for (idx, predicate) in query.predicates().iter().enumerate() {
        let param = PARAMS[idx];
        let (clause, binding) = match predicate {
            // Top-level pages have no parent value stored at all.
            Predicate::ParentEq(None) => {
                clauses.push("parent_id = NONE".to_string());
                continue;
            }
            Predicate::IdEq(id) => (
                format!("meta::id(id) = ${param}"),
                Binding::Str(id.to_string()),
            ),
            Predicate::SubsiteIn { ids, .. } => (
                format!("subsite_id IN ${param}"),
                Binding::Strs(ids.iter().map(|id| id.to_string()).collect()),
            ),
            Predicate::UrlSegmentEq(segment) => (
                format!("url_segment = ${param}"),
                Binding::Str(segment.clone()),
            ),
            Predicate::ParentEq(Some(parent)) => (
                format!("parent_id = ${param}"),
                Binding::Str(parent.to_string()),
            ),
            Predicate::PageTypeEq(page_type) => (
                format!("page_type = ${param}"),
                Binding::Str(page_type.clone()),
            ),
        };
        clauses.push(clause);
        bindings.push((param, binding));
    }

    let mut sql = format!("SELECT meta::id(id) AS record_id, * FROM {table}");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at ASC");
    if let Some(limit) = query.limit_value() {
        let param = PARAMS[query.predicates().len()];
        sql.push_str(&format!(" LIMIT ${param}"));
        bindings.push((param, Binding::Limit(limit)));
    }

    Ok(RenderedQuery { sql, bindings })
}

#[cfg(test)]
mod tests {
    use subsites_core::SubsiteId;
    use subsites_core::context::TenantContext;
    use subsites_core::query::QueryPipeline;

    use super::*;

    #[test]
    fn renders_scoped_segment_lookup() {
        let subsite = SubsiteId::new_v4();
        let ctx = TenantContext::for_subsite(subsite);
        let query =
            QueryPipeline::scoped().prepare(&ctx, PageQuery::live().url_segment("about-us"));

        let rendered = render_select(&query).unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT meta::id(id) AS record_id, * FROM page_live \
             WHERE url_segment = $p0 AND subsite_id IN $p1 ORDER BY created_at ASC"
        );
        assert_eq!(
            rendered.bindings,
            vec![
                ("p0", Binding::Str("about-us".into())),
                ("p1", Binding::Strs(vec![subsite.to_string()])),
            ]
        );
    }

    #[test]
    fn limit_takes_the_next_parameter() {
        let parent = uuid::Uuid::new_v4();
        let rendered = render_select(&PageQuery::draft().parent(Some(parent)).limit(1)).unwrap();
        assert!(
            rendered
                .sql
                .ends_with("WHERE parent_id = $p0 ORDER BY created_at ASC LIMIT $p1")
        );
        assert_eq!(rendered.bindings[1], ("p1", Binding::Limit(1)));
    }

    #[test]
    fn top_level_filter_needs_no_binding() {
        let rendered = render_select(&PageQuery::draft().parent(None)).unwrap();
        assert!(rendered.sql.contains("WHERE parent_id = NONE"));
        assert!(rendered.bindings.is_empty());
    }

    #[test]
    fn rejects_joins() {
        let err = render_select(&PageQuery::draft().join("page_live")).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedQuery(_)));
    }
}
