use std::borrow::Cow;
use std::collections::HashMap;

use tracing::trace;

/// Hosting domains with a built-in canonical base URL. Aliases point at the
/// base of the service they belong to.
static BUILTIN_HOSTS: &[(&str, &str)] = &[
    ("github.com", "https://github.com"),
    ("github.io", "https://github.com"),
    ("github.org", "https://github.com"),
    ("githubusercontent.com", "https://github.com"),
    ("gitlab.com", "https://gitlab.com"),
    ("bitbucket.org", "https://bitbucket.org"),
    ("bitbucket.com", "https://bitbucket.org"),
    ("codeberg.org", "https://codeberg.org"),
    ("sr.ht", "https://sr.ht"),
    ("sourceforge.net", "https://sourceforge.net"),
];

/// Subdomains that may be dropped when they prefix a known domain.
static BUILTIN_SUBDOMAINS: &[&str] = &["www", "ssh", "raw", "git", "wiki", "svn"];

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KnownHost {
    pub domain: String,
    pub canonical_base: String,
}

/// Result of mapping a host onto the known-host table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanonicalHost<'a> {
    /// Canonical base URL when the host belongs to a known service.
    pub base: Option<&'a str>,
    /// The host with any recognized subdomain removed.
    pub host: Cow<'a, str>,
}

impl CanonicalHost<'_> {
    /// Base URL to prefix `owner/repo` with, falling back to `https://<host>`.
    #[must_use]
    pub fn base_url(&self) -> Cow<'_, str> {
        match self.base {
            Some(base) => Cow::Borrowed(base),
            None => Cow::Owned(format!("https://{}", self.host)),
        }
    }

    /// Bare host name of [`Self::base_url`], without a scheme.
    #[must_use]
    pub fn web_host(&self) -> &str {
        match self.base {
            Some(base) => base.split_once("://").map_or(base, |(_, host)| host),
            None => self.host.as_ref(),
        }
    }
}

/// Immutable table of known hosting domains and the subdomains that are safe
/// to strip in front of them.
///
/// Every `subdomain.domain` combination is indexed up front so the cleaner
/// can look up a host prefix without scanning the table.
#[derive(Clone, Debug)]
pub struct KnownHosts {
    hosts: Vec<KnownHost>,
    subdomains: Vec<String>,
    prefixes: HashMap<String, usize>,
}

impl Default for KnownHosts {
    fn default() -> Self {
        Self::new(BUILTIN_HOSTS.iter().copied(), BUILTIN_SUBDOMAINS.iter().copied())
    }
}

impl KnownHosts {
    #[must_use]
    pub fn new<'h, 's, H, S>(hosts: H, subdomains: S) -> Self
    where
        H: IntoIterator<Item = (&'h str, &'h str)>,
        S: IntoIterator<Item = &'s str>,
    {
        let hosts: Vec<KnownHost> = hosts
            .into_iter()
            .map(|(domain, base)| KnownHost {
                domain: domain.to_ascii_lowercase(),
                canonical_base: base.trim_end_matches('/').to_string(),
            })
            .collect();

        let subdomains: Vec<String> = subdomains.into_iter().map(str::to_ascii_lowercase).collect();

        let mut prefixes = HashMap::with_capacity(hosts.len() * subdomains.len());
        for (i, host) in hosts.iter().enumerate() {
            for sub in &subdomains {
                prefixes.entry(format!("{sub}.{}", host.domain)).or_insert(i);
            }
        }

        Self { hosts, subdomains, prefixes }
    }

    #[must_use]
    pub fn hosts(&self) -> &[KnownHost] {
        &self.hosts
    }

    fn exact(&self, host: &str) -> Option<&KnownHost> {
        self.hosts.iter().find(|h| h.domain.eq_ignore_ascii_case(host))
    }

    fn is_subdomain_token(&self, s: &str) -> bool {
        self.subdomains.iter().any(|sub| sub == s)
    }

    /// Find the first known domain that `host` (lowercased) is a subdomain of,
    /// along with the label(s) in front of it.
    fn parent<'a>(&self, host: &'a str) -> Option<(&KnownHost, &'a str)> {
        self.hosts.iter().find_map(|known| {
            host.strip_suffix(known.domain.as_str())
                .and_then(|prefix| prefix.strip_suffix('.'))
                .filter(|prefix| !prefix.is_empty())
                .map(|prefix| (known, prefix))
        })
    }

    /// If the host-like prefix of `s` (up to the first `/` or `:`) is a
    /// whitelisted subdomain of a known domain, replace it with the bare
    /// domain.
    #[must_use]
    pub fn strip_known_subdomain(&self, s: &str) -> Option<String> {
        if !s.contains('.') {
            return None;
        }

        let end = s.find(['/', ':']).unwrap_or(s.len());
        let (host, rest) = s.split_at(end);
        let &i = self.prefixes.get(host.to_ascii_lowercase().as_str())?;
        let domain = &self.hosts[i].domain;

        trace!(host, domain = domain.as_str(), "stripped known subdomain");
        Some(format!("{domain}{rest}"))
    }

    /// Map `host` onto its canonical base URL.
    ///
    /// Exact matches win. Otherwise a host under a known domain gets that
    /// domain's base; a whitelisted subdomain is dropped from the returned
    /// host but any other subdomain is kept. Unknown hosts come back verbatim
    /// with no base.
    #[must_use]
    pub fn canonicalize<'a>(&'a self, host: &'a str) -> CanonicalHost<'a> {
        if let Some(known) = self.exact(host) {
            return CanonicalHost {
                base: Some(known.canonical_base.as_str()),
                host: Cow::Borrowed(known.domain.as_str()),
            };
        }

        let lower = host.to_ascii_lowercase();
        if let Some((known, sub)) = self.parent(&lower) {
            let host = if self.is_subdomain_token(sub) {
                Cow::Borrowed(known.domain.as_str())
            } else {
                Cow::Owned(lower.clone())
            };
            return CanonicalHost {
                base: Some(known.canonical_base.as_str()),
                host,
            };
        }

        CanonicalHost {
            base: None,
            host: Cow::Borrowed(host),
        }
    }

    /// Whether `host` is a known domain or any subdomain of one.
    #[must_use]
    pub fn is_known(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        self.exact(host).is_some() || self.parent(&host.to_ascii_lowercase()).is_some()
    }
}
