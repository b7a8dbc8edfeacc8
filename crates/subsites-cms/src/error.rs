//! Service-level error types.

use subsites_core::SubsiteId;
use subsites_core::error::SubsitesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("page type '{page_type}' is not allowed on subsite {subsite_id}")]
    PageTypeNotAllowed {
        page_type: String,
        subsite_id: SubsiteId,
    },

    #[error("{hook} rejected the duplicate: {reason}")]
    HookRejected { hook: String, reason: String },
}

impl From<CmsError> for SubsitesError {
    fn from(err: CmsError) -> Self {
        match err {
            CmsError::PageTypeNotAllowed { .. } => SubsitesError::Validation {
                message: err.to_string(),
            },
            CmsError::HookRejected { hook, reason } => SubsitesError::HookRejected { hook, reason },
        }
    }
}
