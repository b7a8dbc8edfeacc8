//! The acting principal of a request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is performing an operation. Anonymous requests are explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Principal {
    Anonymous,
    Member(Uuid),
}

impl Principal {
    pub fn member_id(&self) -> Option<Uuid> {
        match self {
            Principal::Anonymous => None,
            Principal::Member(id) => Some(*id),
        }
    }
}
