//! Member-to-subsite capability grants and the access lookup built on
//! them.

use subsites_core::error::SubsitesResult;
use subsites_core::models::principal::Principal;
use subsites_core::models::subsite::SubsiteId;
use subsites_core::repository::SubsiteAccessLookup;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::parse_subsite_id;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Capability grants per member and subsite.
#[derive(Clone)]
pub struct SurrealGrantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGrantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Grant `capability` on `subsite_id` to a member. Granting on
    /// [`SubsiteId::MAIN`] covers every subsite. Granting twice is a no-op.
    pub async fn grant(
        &self,
        member_id: Uuid,
        subsite_id: SubsiteId,
        capability: &str,
    ) -> SubsitesResult<()> {
        let member_str = member_id.to_string();
        let subsite_str = subsite_id.to_string();

        let mut existing = self
            .db
            .query(
                "SELECT count() AS total FROM subsite_grant \
                 WHERE member_id = $member_id AND subsite_id = $subsite_id \
                 AND capability = $capability GROUP ALL",
            )
            .bind(("member_id", member_str.clone()))
            .bind(("subsite_id", subsite_str.clone()))
            .bind(("capability", capability.to_string()))
            .await
            .map_err(DbError::from)?;

        let counts: Vec<CountRow> = existing.take(0).map_err(DbError::from)?;
        if counts.first().map(|r| r.total).unwrap_or(0) > 0 {
            return Ok(());
        }

        self.db
            .query(
                "CREATE subsite_grant SET member_id = $member_id, \
                 subsite_id = $subsite_id, capability = $capability",
            )
            .bind(("member_id", member_str))
            .bind(("subsite_id", subsite_str))
            .bind(("capability", capability.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        debug!(
            member_id = %member_id,
            subsite_id = %subsite_id,
            capability,
            "Granted subsite capability"
        );

        Ok(())
    }

    pub async fn revoke(
        &self,
        member_id: Uuid,
        subsite_id: SubsiteId,
        capability: &str,
    ) -> SubsitesResult<()> {
        self.db
            .query(
                "DELETE subsite_grant WHERE member_id = $member_id \
                 AND subsite_id = $subsite_id AND capability = $capability",
            )
            .bind(("member_id", member_id.to_string()))
            .bind(("subsite_id", subsite_id.to_string()))
            .bind(("capability", capability.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}

impl<C: Connection> SubsiteAccessLookup for SurrealGrantRepository<C> {
    async fn accessible_subsites(
        &self,
        principal: &Principal,
        capability: &str,
    ) -> SubsitesResult<Vec<SubsiteId>> {
        let Some(member_id) = principal.member_id() else {
            return Ok(Vec::new());
        };

        let mut result = self
            .db
            .query(
                "SELECT VALUE subsite_id FROM subsite_grant \
                 WHERE member_id = $member_id AND capability = $capability",
            )
            .bind(("member_id", member_id.to_string()))
            .bind(("capability", capability.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<String> = result.take(0).map_err(DbError::from)?;
        let mut ids = rows
            .iter()
            .map(|row| parse_subsite_id(row))
            .collect::<Result<Vec<_>, DbError>>()?;
        ids.sort();
        ids.dedup();

        Ok(ids)
    }
}
