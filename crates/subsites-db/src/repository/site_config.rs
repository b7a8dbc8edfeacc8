//! SurrealDB implementation of [`SiteConfigRepository`].

use chrono::{DateTime, Utc};
use subsites_core::error::{SubsitesError, SubsitesResult};
use subsites_core::models::site_config::{CreateSiteConfig, SiteConfig};
use subsites_core::models::subsite::SubsiteId;
use subsites_core::repository::SiteConfigRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_subsite_id, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SiteConfigRow {
    subsite_id: String,
    title: String,
    tagline: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SiteConfigRow {
    fn into_config(self, id: Uuid) -> Result<SiteConfig, DbError> {
        Ok(SiteConfig {
            id,
            subsite_id: parse_subsite_id(&self.subsite_id)?,
            title: self.title,
            tagline: self.tagline,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SiteConfigRowWithId {
    record_id: String,
    subsite_id: String,
    title: String,
    tagline: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SiteConfigRowWithId {
    fn try_into_config(self) -> Result<SiteConfig, DbError> {
        let id = parse_uuid(&self.record_id, "site config")?;
        SiteConfigRow {
            subsite_id: self.subsite_id,
            title: self.title,
            tagline: self.tagline,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_config(id)
    }
}

#[derive(Clone)]
pub struct SurrealSiteConfigRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSiteConfigRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SiteConfigRepository for SurrealSiteConfigRepository<C> {
    async fn create(&self, input: CreateSiteConfig) -> SubsitesResult<SiteConfig> {
        if self.get_for_subsite(input.subsite_id).await?.is_some() {
            return Err(SubsitesError::AlreadyExists {
                entity: format!("site_config for subsite {}", input.subsite_id),
            });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('site_config', $id) SET \
                 subsite_id = $subsite_id, title = $title, tagline = $tagline",
            )
            .bind(("id", id_str.clone()))
            .bind(("subsite_id", input.subsite_id.to_string()))
            .bind(("title", input.title))
            .bind(("tagline", input.tagline))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;
        let rows: Vec<SiteConfigRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "site_config".into(),
            id: id_str,
        })?;

        Ok(row.into_config(id)?)
    }

    async fn get_for_subsite(&self, subsite_id: SubsiteId) -> SubsitesResult<Option<SiteConfig>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM site_config \
                 WHERE subsite_id = $subsite_id LIMIT 1",
            )
            .bind(("subsite_id", subsite_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SiteConfigRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(SiteConfigRowWithId::try_into_config)
            .transpose()
            .map_err(Into::into)
    }
}
