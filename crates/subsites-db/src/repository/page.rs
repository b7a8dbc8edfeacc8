//! SurrealDB implementation of [`PageRepository`].

use chrono::{DateTime, Utc};
use subsites_core::error::{SubsitesError, SubsitesResult};
use subsites_core::models::page::{NewPage, Page, Stage, UpdatePage};
use subsites_core::query::PageQuery;
use subsites_core::repository::PageRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_optional_uuid, parse_subsite_id};
use crate::error::DbError;
use crate::query::{Binding, render_select};

#[derive(Debug, SurrealValue)]
struct PageRow {
    page_type: String,
    parent_id: Option<String>,
    subsite_id: String,
    title: String,
    url_segment: String,
    content: String,
    has_broken_link: bool,
    needs_publication_check: bool,
    master_page_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PageRow {
    fn into_page(self, id: Uuid) -> Result<Page, DbError> {
        Ok(Page {
            id,
            page_type: self.page_type,
            parent_id: parse_optional_uuid(self.parent_id, "parent")?,
            subsite_id: parse_subsite_id(&self.subsite_id)?,
            title: self.title,
            url_segment: self.url_segment,
            content: self.content,
            has_broken_link: self.has_broken_link,
            needs_publication_check: self.needs_publication_check,
            master_page_id: parse_optional_uuid(self.master_page_id, "master page")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct PageRowWithId {
    record_id: String,
    page_type: String,
    parent_id: Option<String>,
    subsite_id: String,
    title: String,
    url_segment: String,
    content: String,
    has_broken_link: bool,
    needs_publication_check: bool,
    master_page_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PageRowWithId {
    fn try_into_page(self) -> Result<Page, DbError> {
        let id = super::parse_uuid(&self.record_id, "page")?;
        PageRow {
            page_type: self.page_type,
            parent_id: self.parent_id,
            subsite_id: self.subsite_id,
            title: self.title,
            url_segment: self.url_segment,
            content: self.content,
            has_broken_link: self.has_broken_link,
            needs_publication_check: self.needs_publication_check,
            master_page_id: self.master_page_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_page(id)
    }
}

const PAGE_FIELDS: &str = "page_type = $page_type, parent_id = $parent_id, \
     subsite_id = $subsite_id, title = $title, url_segment = $url_segment, \
     content = $content, has_broken_link = $has_broken_link, \
     needs_publication_check = $needs_publication_check, \
     master_page_id = $master_page_id";

/// SurrealDB implementation of the Page repository.
///
/// Draft rows live in `page`, published rows in `page_live` under the
/// same record id.
#[derive(Clone)]
pub struct SurrealPageRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPageRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PageRepository for SurrealPageRepository<C> {
    async fn create(&self, input: NewPage) -> SubsitesResult<Page> {
        let subsite_id = input.subsite_id.ok_or_else(|| SubsitesError::Validation {
            message: "page subsite must be bound before it is written".into(),
        })?;
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let query = format!("CREATE type::record('page', $id) SET {PAGE_FIELDS}");

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("page_type", input.page_type))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .bind(("subsite_id", subsite_id.to_string()))
            .bind(("title", input.title))
            .bind(("url_segment", input.url_segment))
            .bind(("content", input.content))
            .bind(("has_broken_link", input.has_broken_link))
            .bind(("needs_publication_check", input.needs_publication_check))
            .bind(("master_page_id", input.master_page_id.map(|p| p.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<PageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "page".into(),
            id: id_str,
        })?;

        Ok(row.into_page(id)?)
    }

    async fn get_by_id(&self, stage: Stage, id: Uuid) -> SubsitesResult<Page> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record($table, $id)")
            .bind(("table", stage.table()))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: stage.table().into(),
            id: id_str,
        })?;

        Ok(row.into_page(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdatePage) -> SubsitesResult<Page> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.url_segment.is_some() {
            sets.push("url_segment = $url_segment");
        }
        if input.content.is_some() {
            sets.push("content = $content");
        }
        if input.parent_id.is_some() {
            sets.push("parent_id = $parent_id");
        }
        if input.subsite_id.is_some() {
            sets.push("subsite_id = $subsite_id");
        }
        if input.has_broken_link.is_some() {
            sets.push("has_broken_link = $has_broken_link");
        }
        if input.needs_publication_check.is_some() {
            sets.push("needs_publication_check = $needs_publication_check");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('page', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(url_segment) = input.url_segment {
            builder = builder.bind(("url_segment", url_segment));
        }
        if let Some(content) = input.content {
            builder = builder.bind(("content", content));
        }
        if let Some(parent_id) = input.parent_id {
            builder = builder.bind(("parent_id", parent_id.map(|p| p.to_string())));
        }
        if let Some(subsite_id) = input.subsite_id {
            builder = builder.bind(("subsite_id", subsite_id.to_string()));
        }
        if let Some(flag) = input.has_broken_link {
            builder = builder.bind(("has_broken_link", flag));
        }
        if let Some(flag) = input.needs_publication_check {
            builder = builder.bind(("needs_publication_check", flag));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<PageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "page".into(),
            id: id_str,
        })?;

        Ok(row.into_page(id)?)
    }

    async fn delete(&self, id: Uuid) -> SubsitesResult<()> {
        let id_str = id.to_string();

        // Clean up link edges and owned records, then both stages.
        let query = format!(
            "DELETE cross_subsite_link WHERE in = page:`{id_str}` OR out = page:`{id_str}`; \
             DELETE related_record WHERE owner_id = $id; \
             DELETE type::record('page_live', $id); \
             DELETE type::record('page', $id);"
        );

        self.db
            .query(query)
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn select(&self, query: &PageQuery) -> SubsitesResult<Vec<Page>> {
        let rendered = render_select(query)?;

        let mut builder = self.db.query(rendered.sql);
        for (name, value) in rendered.bindings {
            builder = match value {
                Binding::Str(v) => builder.bind((name, v)),
                Binding::Strs(v) => builder.bind((name, v)),
                Binding::Limit(v) => builder.bind((name, v)),
            };
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<PageRowWithId> = result.take(0).map_err(DbError::from)?;

        let pages = rows
            .into_iter()
            .map(|row| row.try_into_page())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(pages)
    }

    async fn publish(&self, id: Uuid) -> SubsitesResult<Page> {
        let draft = self.get_by_id(Stage::Draft, id).await?;
        let id_str = id.to_string();

        let query = format!(
            "DELETE type::record('page_live', $id); \
             CREATE type::record('page_live', $id) SET {PAGE_FIELDS};"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("page_type", draft.page_type))
            .bind(("parent_id", draft.parent_id.map(|p| p.to_string())))
            .bind(("subsite_id", draft.subsite_id.to_string()))
            .bind(("title", draft.title))
            .bind(("url_segment", draft.url_segment))
            .bind(("content", draft.content))
            .bind(("has_broken_link", draft.has_broken_link))
            .bind(("needs_publication_check", false))
            .bind(("master_page_id", draft.master_page_id.map(|p| p.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        // Statement 0 is the DELETE, statement 1 is the CREATE.
        let rows: Vec<PageRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "page_live".into(),
            id: id_str,
        })?;

        Ok(row.into_page(id)?)
    }
}
