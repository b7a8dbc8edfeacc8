//! Page domain model.
//!
//! A page always belongs to exactly one subsite once persisted. Before
//! that, a [`NewPage`] may leave its subsite unset and have it bound from
//! the request context at write time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::subsite::SubsiteId;

/// Which copy of the page tree a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Stage {
    #[default]
    Draft,
    Live,
}

impl Stage {
    pub const fn table(self) -> &'static str {
        match self {
            Stage::Draft => PAGE_TABLE,
            Stage::Live => PAGE_LIVE_TABLE,
        }
    }
}

pub const PAGE_TABLE: &str = "page";
pub const PAGE_LIVE_TABLE: &str = "page_live";

/// Whether a table holds pages (either stage).
pub fn is_page_table(table: &str) -> bool {
    table == PAGE_TABLE || table == PAGE_LIVE_TABLE
}

/// Anything that may or may not know its subsite yet.
pub trait SubsiteOwned {
    fn owning_subsite(&self) -> Option<SubsiteId>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    /// Concrete page type name (e.g. `Page`, `BlogHolder`).
    pub page_type: String,
    pub parent_id: Option<Uuid>,
    pub subsite_id: SubsiteId,
    pub title: String,
    pub url_segment: String,
    pub content: String,
    pub has_broken_link: bool,
    /// Set on copies that still need their draft/live state compared.
    pub needs_publication_check: bool,
    /// Deprecated: provenance of a cross-subsite copy. Kept only for
    /// consumers that still read it; nothing here depends on it.
    pub master_page_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn is_main_site(&self) -> bool {
        self.subsite_id.is_main()
    }

    /// Shallow copy of every field except identity and timestamps.
    pub fn duplicate(&self) -> NewPage {
        NewPage {
            page_type: self.page_type.clone(),
            parent_id: self.parent_id,
            subsite_id: Some(self.subsite_id),
            title: self.title.clone(),
            url_segment: self.url_segment.clone(),
            content: self.content.clone(),
            has_broken_link: self.has_broken_link,
            needs_publication_check: self.needs_publication_check,
            master_page_id: self.master_page_id,
        }
    }
}

impl SubsiteOwned for Page {
    fn owning_subsite(&self) -> Option<SubsiteId> {
        Some(self.subsite_id)
    }
}

/// A page that has not been written yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPage {
    pub page_type: String,
    pub parent_id: Option<Uuid>,
    /// `None` = bind from the current subsite on write.
    pub subsite_id: Option<SubsiteId>,
    pub title: String,
    pub url_segment: String,
    pub content: String,
    pub has_broken_link: bool,
    pub needs_publication_check: bool,
    /// Deprecated, see [`Page::master_page_id`].
    pub master_page_id: Option<Uuid>,
}

impl NewPage {
    pub fn new(
        page_type: impl Into<String>,
        title: impl Into<String>,
        url_segment: impl Into<String>,
    ) -> Self {
        Self {
            page_type: page_type.into(),
            parent_id: None,
            subsite_id: None,
            title: title.into(),
            url_segment: url_segment.into(),
            content: String::new(),
            has_broken_link: false,
            needs_publication_check: false,
            master_page_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_subsite(mut self, subsite_id: SubsiteId) -> Self {
        self.subsite_id = Some(subsite_id);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

impl SubsiteOwned for NewPage {
    fn owning_subsite(&self) -> Option<SubsiteId> {
        self.subsite_id
    }
}

/// Fields that can be updated on an existing page.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePage {
    pub title: Option<String>,
    pub url_segment: Option<String>,
    pub content: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = move to root, `None` = no change.
    pub parent_id: Option<Option<Uuid>>,
    pub subsite_id: Option<SubsiteId>,
    pub has_broken_link: Option<bool>,
    pub needs_publication_check: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keeps_fields_but_not_identity() {
        let subsite = SubsiteId::new_v4();
        let page = Page {
            id: Uuid::new_v4(),
            page_type: "Page".into(),
            parent_id: Some(Uuid::new_v4()),
            subsite_id: subsite,
            title: "About".into(),
            url_segment: "about-us".into(),
            content: "<p>hi</p>".into(),
            has_broken_link: false,
            needs_publication_check: false,
            master_page_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let copy = page.duplicate();
        assert_eq!(copy.subsite_id, Some(subsite));
        assert_eq!(copy.url_segment, "about-us");
        assert_eq!(copy.parent_id, page.parent_id);
    }

    #[test]
    fn stage_tables() {
        assert_eq!(Stage::Draft.table(), "page");
        assert_eq!(Stage::Live.table(), "page_live");
        assert!(is_page_table("page_live"));
        assert!(!is_page_table("subsite"));
    }
}
