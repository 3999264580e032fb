//! Picking a repository URL out of registry metadata: named fields, lists of
//! candidate URLs and raw JSON values.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use serde_json::Value;
use tracing::debug;

use crate::parser::RepoUrlParser;

/// Field names tried first, in order, when no priority keys are given.
pub const DEFAULT_KEYS: &[&str] = &[
    "repository",
    "Repository",
    "source",
    "Source",
    "source_code",
    "Source Code",
    "Code",
];

/// Keys of a repository object, e.g. npm's `{"type": "git", "url": "..."}`.
const OBJECT_KEYS: &[&str] = &["url", "git", "http"];

/// Funding links look like repositories but are not.
const SPONSORS: &str = "/sponsors";

impl RepoUrlParser {
    /// First parseable value among `priority_keys` (or [`DEFAULT_KEYS`] when
    /// empty), then among all remaining fields in no particular order.
    /// Values containing `/sponsors` are skipped in the second pass.
    #[must_use]
    pub fn parse_from_map<K, V, S>(
        &self,
        fields: &HashMap<K, V, S>,
        priority_keys: &[&str],
    ) -> Option<String>
    where
        K: Borrow<str> + Eq + Hash,
        V: AsRef<str>,
        S: BuildHasher,
    {
        let keys = if priority_keys.is_empty() {
            DEFAULT_KEYS
        } else {
            priority_keys
        };

        let found = keys
            .iter()
            .filter_map(|&key| fields.get(key))
            .map(AsRef::<str>::as_ref)
            .filter(|value| !value.is_empty())
            .find_map(|value| self.parse(value));
        if found.is_some() {
            return found;
        }

        fields.values().map(AsRef::<str>::as_ref).find_map(|value| {
            if value.contains(SPONSORS) {
                debug!(value, "skipping sponsors link");
                return None;
            }
            self.parse(value)
        })
    }

    /// First of `urls` that parses, skipping empty entries.
    #[must_use]
    pub fn first_repo_url<I>(&self, urls: I) -> Option<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        urls.into_iter().find_map(|url| {
            let url = url.as_ref();
            if url.is_empty() { None } else { self.parse(url) }
        })
    }

    /// Repository URL from a JSON metadata value: a string, an object with a
    /// `url`/`git`/`http` key, or an array of either.
    #[must_use]
    pub fn extract_repo_url(&self, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => self.parse(s),
            Value::Object(obj) => OBJECT_KEYS
                .iter()
                .filter_map(|&key| obj.get(key).and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .find_map(|s| self.parse(s)),
            Value::Array(items) => items.iter().find_map(|item| self.extract_repo_url(item)),
            Value::Null | Value::Bool(_) | Value::Number(_) => None,
        }
    }

    /// First of `values` that yields a repository URL.
    #[must_use]
    pub fn extract_repo_url_with_fallback<'v, I>(&self, values: I) -> Option<String>
    where
        I: IntoIterator<Item = &'v Value>,
    {
        values.into_iter().find_map(|value| self.extract_repo_url(value))
    }
}
