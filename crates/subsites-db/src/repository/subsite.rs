//! SurrealDB implementation of [`SubsiteRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use subsites_core::error::SubsitesResult;
use subsites_core::models::subsite::{
    CreateSubsite, DomainBinding, Subsite, SubsiteDomain, SubsiteId, UpdateSubsite,
    resolve_domain,
};
use subsites_core::repository::SubsiteRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use super::parse_subsite_id;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SubsiteRow {
    title: String,
    is_default: bool,
    theme: Option<String>,
    page_type_blacklist: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubsiteRow {
    fn into_subsite(self, id: SubsiteId, domains: Vec<SubsiteDomain>) -> Subsite {
        Subsite {
            id,
            title: self.title,
            domains,
            is_default: self.is_default,
            theme: self.theme,
            page_type_blacklist: self.page_type_blacklist,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct SubsiteRowWithId {
    record_id: String,
    title: String,
    is_default: bool,
    theme: Option<String>,
    page_type_blacklist: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DomainRow {
    subsite_id: String,
    domain: String,
    is_primary: bool,
}

impl DomainRow {
    fn try_into_binding(self) -> Result<DomainBinding, DbError> {
        Ok(DomainBinding {
            subsite_id: parse_subsite_id(&self.subsite_id)?,
            domain: SubsiteDomain {
                domain: self.domain,
                is_primary: self.is_primary,
            },
        })
    }
}

fn not_found(id: SubsiteId) -> DbError {
    DbError::NotFound {
        entity: "subsite".into(),
        id: id.to_string(),
    }
}

/// SurrealDB implementation of the Subsite repository.
///
/// Domains are stored in `subsite_domain`, one row per binding.
#[derive(Clone)]
pub struct SurrealSubsiteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubsiteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn domains_of(&self, id: SubsiteId) -> Result<Vec<SubsiteDomain>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT subsite_id, domain, is_primary FROM subsite_domain \
                 WHERE subsite_id = $subsite_id ORDER BY created_at ASC",
            )
            .bind(("subsite_id", id.to_string()))
            .await?;

        let rows: Vec<DomainRow> = result.take(0)?;
        Ok(rows
            .into_iter()
            .map(|row| SubsiteDomain {
                domain: row.domain,
                is_primary: row.is_primary,
            })
            .collect())
    }
}

impl<C: Connection> SubsiteRepository for SurrealSubsiteRepository<C> {
    async fn create(&self, input: CreateSubsite) -> SubsitesResult<Subsite> {
        let id = SubsiteId::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('subsite', $id) SET \
                 title = $title, is_default = $is_default, \
                 theme = $theme, page_type_blacklist = $blacklist",
            )
            .bind(("id", id.to_string()))
            .bind(("title", input.title))
            .bind(("is_default", input.is_default))
            .bind(("theme", input.theme))
            .bind(("blacklist", input.page_type_blacklist))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;
        let rows: Vec<SubsiteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id))?;

        for domain in &input.domains {
            self.add_domain(id, domain.clone()).await?;
        }

        Ok(row.into_subsite(id, input.domains))
    }

    async fn get_by_id(&self, id: SubsiteId) -> SubsitesResult<Subsite> {
        if id.is_main() {
            return Err(not_found(id).into());
        }

        let mut result = self
            .db
            .query("SELECT * FROM type::record('subsite', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubsiteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id))?;
        let domains = self.domains_of(id).await?;

        Ok(row.into_subsite(id, domains))
    }

    async fn update(&self, id: SubsiteId, input: UpdateSubsite) -> SubsitesResult<Subsite> {
        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.is_default.is_some() {
            sets.push("is_default = $is_default");
        }
        if input.theme.is_some() {
            sets.push("theme = $theme");
        }
        if input.page_type_blacklist.is_some() {
            sets.push("page_type_blacklist = $blacklist");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('subsite', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(is_default) = input.is_default {
            builder = builder.bind(("is_default", is_default));
        }
        if let Some(theme) = input.theme {
            builder = builder.bind(("theme", theme));
        }
        if let Some(blacklist) = input.page_type_blacklist {
            builder = builder.bind(("blacklist", blacklist));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<SubsiteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id))?;
        let domains = self.domains_of(id).await?;

        Ok(row.into_subsite(id, domains))
    }

    async fn delete(&self, id: SubsiteId) -> SubsitesResult<()> {
        self.db
            .query(
                "DELETE subsite_domain WHERE subsite_id = $subsite_id; \
                 DELETE site_config WHERE subsite_id = $subsite_id; \
                 DELETE subsite_grant WHERE subsite_id = $subsite_id; \
                 DELETE type::record('subsite', $subsite_id);",
            )
            .bind(("subsite_id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self) -> SubsitesResult<Vec<Subsite>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subsite \
                 ORDER BY created_at ASC; \
                 SELECT subsite_id, domain, is_primary FROM subsite_domain \
                 ORDER BY created_at ASC;",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubsiteRowWithId> = result.take(0).map_err(DbError::from)?;
        let domain_rows: Vec<DomainRow> = result.take(1).map_err(DbError::from)?;

        let mut domains: HashMap<SubsiteId, Vec<SubsiteDomain>> = HashMap::new();
        for row in domain_rows {
            let binding = row.try_into_binding()?;
            domains
                .entry(binding.subsite_id)
                .or_default()
                .push(binding.domain);
        }

        rows.into_iter()
            .map(|row| {
                let id = parse_subsite_id(&row.record_id)?;
                Ok(SubsiteRow {
                    title: row.title,
                    is_default: row.is_default,
                    theme: row.theme,
                    page_type_blacklist: row.page_type_blacklist,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                }
                .into_subsite(id, domains.remove(&id).unwrap_or_default()))
            })
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn add_domain(&self, id: SubsiteId, domain: SubsiteDomain) -> SubsitesResult<()> {
        self.db
            .query(
                "CREATE subsite_domain SET subsite_id = $subsite_id, \
                 domain = $domain, is_primary = $is_primary",
            )
            .bind(("subsite_id", id.to_string()))
            .bind(("domain", domain.domain.to_ascii_lowercase()))
            .bind(("is_primary", domain.is_primary))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn domain_bindings(&self) -> SubsitesResult<Vec<DomainBinding>> {
        let mut result = self
            .db
            .query(
                "SELECT subsite_id, domain, is_primary FROM subsite_domain \
                 ORDER BY is_primary DESC, created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DomainRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(DomainRow::try_into_binding)
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn subsite_id_for_domain(&self, host: &str) -> SubsitesResult<SubsiteId> {
        let bindings = self.domain_bindings().await?;
        let id = resolve_domain(host, &bindings);
        debug!(host = %host, subsite_id = %id, "Resolved host to subsite");
        Ok(id)
    }
}
