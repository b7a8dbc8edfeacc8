//! SurrealDB implementation of [`CrossLinkRepository`].
//!
//! Links are `cross_subsite_link` graph edges from one `page` record to
//! another.

use std::collections::BTreeSet;

use subsites_core::error::SubsitesResult;
use subsites_core::models::cross_link::CrossSubsiteLink;
use subsites_core::repository::CrossLinkRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct LinkRow {
    target_id: String,
    field_name: String,
}

#[derive(Clone)]
pub struct SurrealCrossLinkRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCrossLinkRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CrossLinkRepository for SurrealCrossLinkRepository<C> {
    async fn replace_links(
        &self,
        source_id: Uuid,
        field_name: &str,
        target_ids: &[Uuid],
    ) -> SubsitesResult<()> {
        let source_str = source_id.to_string();
        let targets: BTreeSet<Uuid> = target_ids.iter().copied().collect();

        // RELATE requires literal record-id syntax; UUIDs are safe to embed.
        let mut query =
            String::from("DELETE cross_subsite_link WHERE in = type::record('page', $source_id);");
        for target in &targets {
            query.push_str(&format!(
                " RELATE page:`{source_str}` -> cross_subsite_link -> page:`{target}` \
                 SET field_name = $field_name;"
            ));
        }

        self.db
            .query(query)
            .bind(("source_id", source_str))
            .bind(("field_name", field_name.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        debug!(
            source_id = %source_id,
            links = targets.len(),
            "Replaced cross-subsite links"
        );

        Ok(())
    }

    async fn links_from(&self, source_id: Uuid) -> SubsitesResult<Vec<CrossSubsiteLink>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(out) AS target_id, field_name FROM cross_subsite_link \
                 WHERE in = type::record('page', $source_id)",
            )
            .bind(("source_id", source_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LinkRow> = result.take(0).map_err(DbError::from)?;

        let mut links = rows
            .into_iter()
            .map(|row| {
                Ok(CrossSubsiteLink {
                    source_id,
                    target_id: parse_uuid(&row.target_id, "link target")?,
                    field_name: row.field_name,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;
        links.sort_by_key(|link| link.target_id);

        Ok(links)
    }
}
