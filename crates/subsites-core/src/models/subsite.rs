//! Subsite domain model.
//!
//! A subsite is an isolated content partition bound to one or more
//! domains. The main site has no record of its own; it is represented by
//! [`SubsiteId::MAIN`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Identity of a subsite. The nil UUID is the main (default) site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubsiteId(Uuid);

impl SubsiteId {
    /// The main site, "subsite 0".
    pub const MAIN: SubsiteId = SubsiteId(Uuid::nil());

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_main(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SubsiteId {
    fn default() -> Self {
        Self::MAIN
    }
}

impl From<Uuid> for SubsiteId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubsiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SubsiteId {
    type Err = uuid::Error;

    /// Accepts a UUID, or `0` / the empty string for the main site.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "0" {
            return Ok(Self::MAIN);
        }
        Uuid::parse_str(s).map(Self)
    }
}

/// A domain bound to a subsite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsiteDomain {
    /// Host name, optionally with a leading `*.` or trailing `.*` wildcard.
    pub domain: String,
    pub is_primary: bool,
}

impl SubsiteDomain {
    pub fn is_wildcard(&self) -> bool {
        self.domain.contains('*')
    }

    /// Whether this binding matches an already-normalised host.
    pub fn matches(&self, host: &str) -> bool {
        let pattern = self.domain.to_ascii_lowercase();
        if let Some(suffix) = pattern.strip_prefix("*.") {
            return host.len() > suffix.len() + 1
                && host.ends_with(suffix)
                && host.as_bytes()[host.len() - suffix.len() - 1] == b'.';
        }
        if let Some(prefix) = pattern.strip_suffix(".*") {
            return host.len() > prefix.len() + 1
                && host.starts_with(prefix)
                && host.as_bytes()[prefix.len()] == b'.';
        }
        normalize_host(&pattern) == host
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subsite {
    pub id: SubsiteId,
    pub title: String,
    pub domains: Vec<SubsiteDomain>,
    /// A default subsite may act as a copy source, like the main site.
    pub is_default: bool,
    pub theme: Option<String>,
    /// Page type names that may not be created on this subsite.
    pub page_type_blacklist: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subsite {
    /// The canonical domain: the one flagged primary, else the first bound.
    pub fn primary_domain(&self) -> Option<&str> {
        self.domains
            .iter()
            .find(|d| d.is_primary)
            .or_else(|| self.domains.first())
            .map(|d| d.domain.as_str())
    }

    /// Blacklist entries name exact page types; subtypes must be listed too.
    pub fn is_page_type_blacklisted(&self, page_type: &str) -> bool {
        self.page_type_blacklist.iter().any(|t| t == page_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubsite {
    pub title: String,
    pub domains: Vec<SubsiteDomain>,
    pub is_default: bool,
    pub theme: Option<String>,
    pub page_type_blacklist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSubsite {
    pub title: Option<String>,
    pub is_default: Option<bool>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub theme: Option<Option<String>>,
    pub page_type_blacklist: Option<Vec<String>>,
}

/// One row of the domain lookup table.
#[derive(Debug, Clone)]
pub struct DomainBinding {
    pub subsite_id: SubsiteId,
    pub domain: SubsiteDomain,
}

/// Lowercase, drop any port and a leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    let host = match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            name.to_string()
        }
        _ => host,
    };
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Resolve a host name to the subsite bound to it.
///
/// Exact bindings take precedence over wildcard ones. Returns
/// [`SubsiteId::MAIN`] when nothing matches, or when more than one
/// subsite matches at the same precedence.
pub fn resolve_domain(host: &str, bindings: &[DomainBinding]) -> SubsiteId {
    let host = normalize_host(host);

    let exact = distinct_matches(&host, bindings, false);
    let candidates = if exact.is_empty() {
        distinct_matches(&host, bindings, true)
    } else {
        exact
    };

    match candidates.as_slice() {
        [] => SubsiteId::MAIN,
        [only] => *only,
        many => {
            warn!(
                host = %host,
                matches = many.len(),
                "Host matches more than one subsite; treating as main site"
            );
            SubsiteId::MAIN
        }
    }
}

fn distinct_matches(host: &str, bindings: &[DomainBinding], wildcard: bool) -> Vec<SubsiteId> {
    let mut ids: Vec<SubsiteId> = Vec::new();
    for binding in bindings {
        if binding.domain.is_wildcard() == wildcard
            && binding.domain.matches(host)
            && !ids.contains(&binding.subsite_id)
        {
            ids.push(binding.subsite_id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(id: SubsiteId, domain: &str) -> DomainBinding {
        DomainBinding {
            subsite_id: id,
            domain: SubsiteDomain {
                domain: domain.into(),
                is_primary: false,
            },
        }
    }

    #[test]
    fn main_id_round_trips_through_zero() {
        assert_eq!("0".parse::<SubsiteId>().unwrap(), SubsiteId::MAIN);
        assert_eq!("".parse::<SubsiteId>().unwrap(), SubsiteId::MAIN);
        assert!(SubsiteId::MAIN.is_main());
        assert!(!SubsiteId::new_v4().is_main());
        assert!("not-a-uuid".parse::<SubsiteId>().is_err());
    }

    #[test]
    fn host_normalisation() {
        assert_eq!(normalize_host("WWW.Example.com:8080"), "example.com");
        assert_eq!(normalize_host("sub2.example.com"), "sub2.example.com");
    }

    #[test]
    fn exact_beats_wildcard() {
        let a = SubsiteId::new_v4();
        let b = SubsiteId::new_v4();
        let bindings = vec![binding(a, "*.example.com"), binding(b, "sub2.example.com")];

        assert_eq!(resolve_domain("sub2.example.com", &bindings), b);
        assert_eq!(resolve_domain("other.example.com", &bindings), a);
        assert_eq!(resolve_domain("example.com", &bindings), SubsiteId::MAIN);
    }

    #[test]
    fn trailing_wildcard_matches_any_tld() {
        let a = SubsiteId::new_v4();
        let bindings = vec![binding(a, "shop.*")];
        assert_eq!(resolve_domain("shop.co.nz", &bindings), a);
        assert_eq!(resolve_domain("shopping.com", &bindings), SubsiteId::MAIN);
    }

    #[test]
    fn ambiguous_host_falls_back_to_main() {
        let a = SubsiteId::new_v4();
        let b = SubsiteId::new_v4();
        let bindings = vec![binding(a, "dup.example.com"), binding(b, "dup.example.com")];
        assert_eq!(resolve_domain("dup.example.com", &bindings), SubsiteId::MAIN);
    }

    #[test]
    fn primary_domain_prefers_flag() {
        let subsite = Subsite {
            id: SubsiteId::new_v4(),
            title: "Sub".into(),
            domains: vec![
                SubsiteDomain {
                    domain: "a.example.com".into(),
                    is_primary: false,
                },
                SubsiteDomain {
                    domain: "b.example.com".into(),
                    is_primary: true,
                },
            ],
            is_default: false,
            theme: None,
            page_type_blacklist: vec!["RedirectorPage".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(subsite.primary_domain(), Some("b.example.com"));
        assert!(subsite.is_page_type_blacklisted("RedirectorPage"));
        assert!(!subsite.is_page_type_blacklisted("Page"));
    }
}
