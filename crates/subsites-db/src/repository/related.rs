//! SurrealDB implementation of [`RelatedRecordRepository`].

use chrono::{DateTime, Utc};
use subsites_core::error::SubsitesResult;
use subsites_core::models::related::{CreateRelatedRecord, RelatedRecord};
use subsites_core::repository::RelatedRecordRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RelatedRow {
    owner_id: String,
    relation: String,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RelatedRowWithId {
    record_id: String,
    owner_id: String,
    relation: String,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl RelatedRow {
    fn into_record(self, id: Uuid) -> Result<RelatedRecord, DbError> {
        Ok(RelatedRecord {
            id,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            relation: self.relation,
            data: self.data,
            created_at: self.created_at,
        })
    }
}

impl RelatedRowWithId {
    fn try_into_record(self) -> Result<RelatedRecord, DbError> {
        let id = parse_uuid(&self.record_id, "related record")?;
        RelatedRow {
            owner_id: self.owner_id,
            relation: self.relation,
            data: self.data,
            created_at: self.created_at,
        }
        .into_record(id)
    }
}

#[derive(Clone)]
pub struct SurrealRelatedRecordRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRelatedRecordRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RelatedRecordRepository for SurrealRelatedRecordRepository<C> {
    async fn create(&self, input: CreateRelatedRecord) -> SubsitesResult<RelatedRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('related_record', $id) SET \
                 owner_id = $owner_id, relation = $relation, data = $data",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("relation", input.relation))
            .bind(("data", input.data))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;
        let rows: Vec<RelatedRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "related_record".into(),
            id: id_str,
        })?;

        Ok(row.into_record(id)?)
    }

    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        relation: &str,
    ) -> SubsitesResult<Vec<RelatedRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM related_record \
                 WHERE owner_id = $owner_id AND relation = $relation \
                 ORDER BY created_at ASC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .bind(("relation", relation.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RelatedRowWithId> = result.take(0).map_err(DbError::from)?;
        let records = rows
            .into_iter()
            .map(RelatedRowWithId::try_into_record)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(records)
    }
}
