//! Extract canonical repository URLs (`https://host/owner/repo`) from the
//! loosely formatted strings found in package registry metadata: homepage
//! fields, SCM tags, SCP-style remotes, URLs with credentials, quotes,
//! fragments or vendor prefixes like `scm:git:` and `git+https:`.
//!
//! Nothing here fails on bad input. When no repository can be found the
//! result is empty (`None` or an empty string).
//!
//! ```
//! assert_eq!(
//!     repo_url::parse("scm:git:https://user@github.com/owner/repo.git#x").as_deref(),
//!     Some("https://github.com/owner/repo")
//! );
//! assert_eq!(repo_url::parse("https://github.com/owner"), None);
//! ```
#![deny(clippy::all, clippy::pedantic, clippy::unwrap_used)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use once_cell::sync::Lazy;
use serde_json::Value;
use url::Url;

mod fields;
mod hosts;
mod parser;
mod repo;

pub use fields::DEFAULT_KEYS;
pub use hosts::{CanonicalHost, KnownHost, KnownHosts};
pub use parser::RepoUrlParser;
pub use repo::{RepoRef, RepositoryError};

static DEFAULT: Lazy<RepoUrlParser> = Lazy::new(RepoUrlParser::default);

/// The parser behind the free functions, built from the compiled-in
/// known-host table on first use.
#[must_use]
pub fn default_parser() -> &'static RepoUrlParser {
    &DEFAULT
}

/// Host and path of `raw` with all decoration removed, e.g.
/// `git@github.com:owner/repo.git` becomes `github.com/owner/repo`.
#[must_use]
pub fn clean(raw: &str) -> String {
    DEFAULT.clean(raw)
}

/// `raw` as an `https://` URL with credentials, schemes, `.git` and SCP
/// colons dealt with. Weaker than [`parse`]: any non-empty input gives a
/// non-empty result, whether or not it names a repository.
#[must_use]
pub fn normalize(raw: &str) -> String {
    parser::normalize(raw)
}

/// [`normalize`] followed by a real URL parse.
#[must_use]
pub fn normalized_url(raw: &str) -> Option<Url> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return None;
    }
    Url::parse(&normalized).ok()
}

/// Canonical `https://host/owner/repo`, for known and unknown hosts alike.
#[must_use]
pub fn parse(raw: &str) -> Option<String> {
    DEFAULT.parse(raw)
}

#[must_use]
pub fn extract_host(raw: &str) -> Option<String> {
    DEFAULT.extract_host(raw)
}

#[must_use]
pub fn extract_path(raw: &str) -> Option<String> {
    DEFAULT.extract_path(raw)
}

#[must_use]
pub fn extract_owner_repo(raw: &str) -> Option<String> {
    DEFAULT.extract_owner_repo(raw)
}

#[must_use]
pub fn parse_url(raw: &str) -> Option<RepoRef> {
    DEFAULT.parse_url(raw)
}

#[must_use]
pub fn is_known_host(raw: &str) -> bool {
    DEFAULT.is_known_host(raw)
}

/// [`parse`], restricted to hosts in the known-host table.
#[must_use]
pub fn canonical_url(raw: &str) -> Option<String> {
    DEFAULT.canonical_url(raw)
}

#[must_use]
pub fn parse_from_map<K, V, S>(fields: &HashMap<K, V, S>, priority_keys: &[&str]) -> Option<String>
where
    K: Borrow<str> + Eq + Hash,
    V: AsRef<str>,
    S: BuildHasher,
{
    DEFAULT.parse_from_map(fields, priority_keys)
}

#[must_use]
pub fn first_repo_url<I>(urls: I) -> Option<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    DEFAULT.first_repo_url(urls)
}

#[must_use]
pub fn extract_repo_url(value: &Value) -> Option<String> {
    DEFAULT.extract_repo_url(value)
}

#[must_use]
pub fn extract_repo_url_with_fallback<'v, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'v Value>,
{
    DEFAULT.extract_repo_url_with_fallback(values)
}
