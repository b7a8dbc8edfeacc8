//! SurrealDB repository implementations.

mod cross_link;
mod grant;
mod page;
mod related;
mod site_config;
mod subsite;

pub use cross_link::SurrealCrossLinkRepository;
pub use grant::SurrealGrantRepository;
pub use page::SurrealPageRepository;
pub use related::SurrealRelatedRecordRepository;
pub use site_config::SurrealSiteConfigRepository;
pub use subsite::SurrealSubsiteRepository;

use subsites_core::SubsiteId;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn parse_subsite_id(value: &str) -> Result<SubsiteId, DbError> {
    parse_uuid(value, "subsite").map(SubsiteId::from)
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    what: &str,
) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(&v, what)).transpose()
}
