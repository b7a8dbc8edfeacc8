//! Tracking of links from page content into other subsites.
//!
//! Each pass extracts the absolute `href`/`src` links in a page's
//! content, resolves each link's host to a subsite and looks for a page
//! in that subsite with the link's last path segment. Found pages replace
//! the page's whole outgoing link set; a missing page flags the source as
//! having a broken link.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use subsites_core::error::SubsitesResult;
use subsites_core::models::page::{Page, UpdatePage};
use subsites_core::repository::{CrossLinkRepository, PageRepository, SubsiteRepository};
use subsites_core::{PageQuery, QueryPipeline, TenantContext};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::SubsitesConfig;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:href|src)\s*=\s*["'](https?://[^"'\s<>]+)["']"#)
        .expect("link pattern is a valid regex")
});

/// An absolute link that names a host and a page segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLink {
    pub url: String,
    pub host: String,
    /// Last non-empty path segment, percent-decoded.
    pub segment: String,
}

/// Absolute links in `content`, in order of appearance. Links without a
/// host or with an empty path are dropped.
pub fn extract_links(content: &str) -> Vec<ContentLink> {
    LINK_PATTERN
        .captures_iter(content)
        .filter_map(|caps| parse_link(&caps[1]))
        .collect()
}

fn parse_link(raw: &str) -> Option<ContentLink> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_string();
    let last = url.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let segment = urlencoding::decode(last).ok()?.into_owned();

    Some(ContentLink {
        url: raw.to_string(),
        host,
        segment,
    })
}

/// Outcome of one link sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSyncReport {
    /// Target pages now linked, deduplicated and sorted.
    pub linked: Vec<Uuid>,
    /// Links whose subsite was known but whose page was not found.
    pub broken: Vec<String>,
    /// Links whose host did not resolve to a subsite.
    pub skipped: usize,
}

impl LinkSyncReport {
    pub fn has_broken_link(&self) -> bool {
        !self.broken.is_empty()
    }
}

pub struct LinkTracker<P, L, S>
where
    P: PageRepository,
    L: CrossLinkRepository,
    S: SubsiteRepository,
{
    pages: P,
    links: L,
    subsites: S,
    pipeline: QueryPipeline,
    field_name: String,
}

impl<P, L, S> LinkTracker<P, L, S>
where
    P: PageRepository,
    L: CrossLinkRepository,
    S: SubsiteRepository,
{
    pub fn new(pages: P, links: L, subsites: S, config: &SubsitesConfig) -> Self {
        Self {
            pages,
            links,
            subsites,
            pipeline: QueryPipeline::scoped(),
            field_name: config.link_field_name.clone(),
        }
    }

    /// Re-derive `page`'s cross-subsite links from its current content.
    ///
    /// Running this twice on unchanged content yields the same link set
    /// and the same broken-link flag.
    pub async fn sync_links(
        &self,
        ctx: &mut TenantContext,
        page: &mut Page,
    ) -> SubsitesResult<LinkSyncReport> {
        let mut report = LinkSyncReport::default();
        let mut targets = BTreeSet::new();

        for link in extract_links(&page.content) {
            let subsite_id = self.subsites.subsite_id_for_domain(&link.host).await?;
            if subsite_id.is_main() {
                report.skipped += 1;
                continue;
            }

            // Look across subsites for this one lookup only.
            let query = {
                let guard = ctx.without_filter();
                self.pipeline.prepare(
                    &guard,
                    PageQuery::draft()
                        .url_segment(link.segment.clone())
                        .in_subsites(vec![subsite_id])
                        .limit(1),
                )
            };

            match self.pages.select(&query).await?.into_iter().next() {
                Some(target) => {
                    targets.insert(target.id);
                }
                None => {
                    warn!(
                        page_id = %page.id,
                        subsite_id = %subsite_id,
                        url = %link.url,
                        "Link target not found in subsite"
                    );
                    report.broken.push(link.url);
                }
            }
        }

        report.linked = targets.into_iter().collect();
        self.links
            .replace_links(page.id, &self.field_name, &report.linked)
            .await?;

        let broken = report.has_broken_link();
        if page.has_broken_link != broken {
            // Only the flag is written back; the caller's edits stay in place.
            let stored = self
                .pages
                .update(
                    page.id,
                    UpdatePage {
                        has_broken_link: Some(broken),
                        ..Default::default()
                    },
                )
                .await?;
            page.has_broken_link = stored.has_broken_link;
            page.updated_at = stored.updated_at;
        }

        info!(
            page_id = %page.id,
            linked = report.linked.len(),
            broken = report.broken.len(),
            skipped = report.skipped,
            "Synced cross-subsite links"
        );
        debug!(page_id = %page.id, targets = ?report.linked, "Link targets");

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_absolute_href_and_src_links() {
        let content = r#"<p><a href="http://sub2.example.com/about-us">About</a>
            <img src='https://cdn.example.com/images/logo.png'>
            <a href="/relative">Relative</a></p>"#;

        let links = extract_links(content);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].host, "sub2.example.com");
        assert_eq!(links[0].segment, "about-us");
        assert_eq!(links[1].host, "cdn.example.com");
        assert_eq!(links[1].segment, "logo.png");
    }

    #[test]
    fn uses_last_segment_without_query_or_fragment() {
        let links = extract_links(
            r#"<a href="http://sub2.example.com/company/about-us/?ref=home#team">x</a>"#,
        );
        assert_eq!(links[0].segment, "about-us");
    }

    #[test]
    fn decodes_percent_encoded_segments() {
        let links = extract_links(r#"<a href="http://sub2.example.com/caf%C3%A9">x</a>"#);
        assert_eq!(links[0].segment, "café");
    }

    #[test]
    fn skips_links_to_the_site_root() {
        assert!(extract_links(r#"<a href="http://sub2.example.com/">x</a>"#).is_empty());
        assert!(extract_links(r#"<a href="http://sub2.example.com">x</a>"#).is_empty());
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let links = extract_links(r#"<A HREF="http://sub2.example.com/contact">x</A>"#);
        assert_eq!(links.len(), 1);
    }
}
