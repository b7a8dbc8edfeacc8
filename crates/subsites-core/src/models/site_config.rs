//! Per-subsite site configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::subsite::SubsiteId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub id: Uuid,
    pub subsite_id: SubsiteId,
    pub title: String,
    pub tagline: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSiteConfig {
    pub subsite_id: SubsiteId,
    pub title: String,
    pub tagline: String,
}
