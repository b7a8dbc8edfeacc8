//! Records owned by a page through a named relation.
//!
//! These are the rows the duplication engine copies when a page type
//! lists the relation as one to carry over to another subsite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Relation name on the owning page type (e.g. `Attachments`).
    pub relation: String,
    /// Arbitrary record payload.
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl RelatedRecord {
    /// Shallow copy rebound to another owner.
    pub fn duplicate_for(&self, owner_id: Uuid) -> CreateRelatedRecord {
        CreateRelatedRecord {
            owner_id,
            relation: self.relation.clone(),
            data: self.data.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRelatedRecord {
    pub owner_id: Uuid,
    pub relation: String,
    pub data: serde_json::Value,
}
