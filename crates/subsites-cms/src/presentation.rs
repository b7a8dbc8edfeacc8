//! Subsite-aware output helpers: the meta marker, the cache key part,
//! link rewriting onto the subsite's domain, and the theme lookup.

use subsites_core::error::{SubsitesError, SubsitesResult};
use subsites_core::models::page::Page;
use subsites_core::models::subsite::Subsite;
use subsites_core::repository::SubsiteRepository;
use subsites_core::{SubsiteId, TenantContext};
use url::Url;

use crate::config::SubsitesConfig;

pub struct Presenter<S: SubsiteRepository> {
    subsites: S,
    config: SubsitesConfig,
}

impl<S: SubsiteRepository> Presenter<S> {
    pub fn new(subsites: S, config: SubsitesConfig) -> Self {
        Self { subsites, config }
    }

    /// Meta tag naming the subsite the rendered page belongs to; empty for
    /// main-site pages.
    pub fn meta_tags(&self, page: &Page) -> String {
        if page.is_main_site() {
            return String::new();
        }
        format!(
            "<meta name=\"{}\" content=\"{}\" />\n",
            self.config.meta_tag_name, page.subsite_id
        )
    }

    /// Cache key part that keeps subsites from sharing cached output.
    pub fn cache_key_component(&self, ctx: &TenantContext) -> String {
        cache_key_for(ctx.current_subsite_id())
    }

    /// Canonical domain of the page's subsite, when it has a concrete one.
    async fn domain_for(&self, page: &Page) -> SubsitesResult<Option<String>> {
        if page.is_main_site() {
            return Ok(None);
        }
        let subsite = match self.subsites.get_by_id(page.subsite_id).await {
            Ok(subsite) => subsite,
            Err(SubsitesError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(concrete_domain(&subsite))
    }

    /// `link` moved onto the page's subsite domain. Relative links are
    /// made absolute; main-site pages keep the link as given.
    pub async fn absolute_link(&self, page: &Page, link: &str) -> SubsitesResult<String> {
        match self.domain_for(page).await? {
            Some(domain) => rebase(link, &self.config.scheme, &domain),
            None => Ok(link.to_string()),
        }
    }

    /// Absolute link carrying the subsite id so a preview renders in the
    /// right subsite.
    pub async fn preview_link(&self, page: &Page, link: &str) -> SubsitesResult<String> {
        let absolute = self.absolute_link(page, link).await?;
        if page.is_main_site() {
            return Ok(absolute);
        }
        let mut url = Url::parse(&absolute).map_err(|e| SubsitesError::Validation {
            message: format!("cannot build preview link from '{absolute}': {e}"),
        })?;
        url.query_pairs_mut()
            .append_pair(&self.config.preview_param, &page.subsite_id.to_string());
        Ok(url.into())
    }

    /// Base URL shown in front of the URL segment field: the subsite's
    /// domain, plus the parent's link when URLs are nested. `None` on the
    /// main site.
    pub async fn url_prefix(
        &self,
        page: &Page,
        parent_link: Option<&str>,
    ) -> SubsitesResult<Option<String>> {
        let Some(domain) = self.domain_for(page).await? else {
            return Ok(None);
        };

        let mut prefix = format!("{}://{}/", self.config.scheme, domain);
        if self.config.nested_urls {
            if let Some(parent) = parent_link.map(|l| l.trim_matches('/')) {
                if !parent.is_empty() {
                    prefix.push_str(parent);
                    prefix.push('/');
                }
            }
        }
        Ok(Some(prefix))
    }

    /// Theme of the current subsite, if it names one.
    pub async fn theme_for(&self, ctx: &TenantContext) -> SubsitesResult<Option<String>> {
        Ok(ctx
            .current_subsite(&self.subsites)
            .await?
            .and_then(|subsite| subsite.theme))
    }
}

fn cache_key_for(subsite_id: SubsiteId) -> String {
    if subsite_id.is_main() {
        "subsite-0".into()
    } else {
        format!("subsite-{subsite_id}")
    }
}

fn concrete_domain(subsite: &Subsite) -> Option<String> {
    let domain = subsite.primary_domain()?;
    if domain.contains('*') {
        return None;
    }
    Some(domain.to_string())
}

fn rebase(link: &str, scheme: &str, domain: &str) -> SubsitesResult<String> {
    let invalid = |e: url::ParseError| SubsitesError::Validation {
        message: format!("cannot rebase '{link}' onto {domain}: {e}"),
    };

    let base = Url::parse(&format!("{scheme}://{domain}/")).map_err(invalid)?;
    let mut url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(link).map_err(invalid)?,
        Err(e) => return Err(invalid(e)),
    };
    url.set_host(base.host_str()).map_err(invalid)?;
    // Ports belong to the old host.
    url.set_port(base.port())
        .map_err(|()| SubsitesError::Validation {
            message: format!("cannot rebase '{link}' onto {domain}: port not allowed"),
        })?;
    Ok(url.into())
}
