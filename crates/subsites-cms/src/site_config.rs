//! Per-subsite site configuration lookup.

use subsites_core::error::SubsitesResult;
use subsites_core::models::page::Page;
use subsites_core::models::site_config::{CreateSiteConfig, SiteConfig};
use subsites_core::repository::SiteConfigRepository;
use subsites_core::SubsiteId;
use tracing::info;

use crate::config::SubsitesConfig;

pub struct SiteConfigResolver<C: SiteConfigRepository> {
    configs: C,
    default_title: String,
    default_tagline: String,
}

impl<C: SiteConfigRepository> SiteConfigResolver<C> {
    pub fn new(configs: C, config: &SubsitesConfig) -> Self {
        Self {
            configs,
            default_title: config.default_site_title.clone(),
            default_tagline: config.default_site_tagline.clone(),
        }
    }

    /// The subsite's config, created with the default title and tagline
    /// on first access.
    pub async fn for_subsite(&self, subsite_id: SubsiteId) -> SubsitesResult<SiteConfig> {
        if let Some(existing) = self.configs.get_for_subsite(subsite_id).await? {
            return Ok(existing);
        }

        info!(subsite_id = %subsite_id, "Creating default site config for subsite");
        self.configs
            .create(CreateSiteConfig {
                subsite_id,
                title: self.default_title.clone(),
                tagline: self.default_tagline.clone(),
            })
            .await
    }

    /// Config that replaces the main one while rendering `page`. Main-site
    /// pages use the main config and get `None`.
    pub async fn site_config_for(&self, page: &Page) -> SubsitesResult<Option<SiteConfig>> {
        if page.is_main_site() {
            return Ok(None);
        }
        self.for_subsite(page.subsite_id).await.map(Some)
    }
}
