//! Cross-subsite link tracking model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A link from one page's content to a page on another subsite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossSubsiteLink {
    pub source_id: Uuid,
    pub target_id: Uuid,
    /// The source field the link was found in (e.g. `Content`).
    pub field_name: String,
}
