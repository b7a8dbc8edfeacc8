//! Subsite service configuration.

use std::collections::HashMap;

/// Configuration shared by the subsite services.
#[derive(Debug, Clone)]
pub struct SubsitesConfig {
    /// Capability a principal needs on a subsite to edit its pages.
    pub edit_capability: String,
    /// Name recorded on cross-subsite links found in page content.
    pub link_field_name: String,
    /// Per page type, the relations copied along with a duplicated page.
    pub duplicate_relations: HashMap<String, Vec<String>>,
    /// Title given to a lazily created subsite site config.
    pub default_site_title: String,
    /// Tagline given to a lazily created subsite site config.
    pub default_site_tagline: String,
    /// Scheme used when building absolute subsite URLs.
    pub scheme: String,
    /// Query parameter carrying the subsite id on preview links.
    pub preview_param: String,
    /// `name` of the meta tag identifying the subsite in rendered output.
    pub meta_tag_name: String,
    /// Whether page URLs include their parent's path.
    pub nested_urls: bool,
}

impl Default for SubsitesConfig {
    fn default() -> Self {
        Self {
            edit_capability: "CMS_ACCESS_CMSMain".into(),
            link_field_name: "Content".into(),
            duplicate_relations: HashMap::new(),
            default_site_title: "Your Site Name".into(),
            default_site_tagline: "Your tagline here".into(),
            scheme: "http".into(),
            preview_param: "SubsiteID".into(),
            meta_tag_name: "x-subsite-id".into(),
            nested_urls: true,
        }
    }
}

impl SubsitesConfig {
    /// Relations to copy for `page_type`; empty when none are configured.
    pub fn relations_to_duplicate(&self, page_type: &str) -> &[String] {
        self.duplicate_relations
            .get(page_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn with_duplicate_relations(
        mut self,
        page_type: impl Into<String>,
        relations: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.duplicate_relations.insert(
            page_type.into(),
            relations.into_iter().map(Into::into).collect(),
        );
        self
    }
}
