use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::hosts::KnownHosts;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RepositoryError {
    #[error("no repository owner/name found in: {0:?}")]
    Spec(String),
}

/// A repository reference as extracted from free-form text.
///
/// `host` is the host as written (minus noise and whitelisted subdomains);
/// `owner` and `repo` are never empty and keep their original casing.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RepoRef {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse with the shared default table, failing when `url` carries no
    /// owner/repo.
    pub fn from_url(url: &str) -> Result<Self, RepositoryError> {
        crate::parse_url(url).ok_or_else(|| RepositoryError::Spec(url.to_string()))
    }

    /// Returns `owner/repo`.
    #[must_use]
    pub fn owner_repo(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Returns the canonical web URL, `https://{host}/{owner}/{repo}`, with
    /// the host mapped through `hosts`.
    #[must_use]
    pub fn canonical_url(&self, hosts: &KnownHosts) -> String {
        let host = hosts.canonicalize(&self.host);
        format!("{}/{}/{}", host.base_url(), self.owner, self.repo)
    }

    /// Returns the URL for cloning the repository via the native Git protocol
    #[must_use]
    pub fn git_url(&self, hosts: &KnownHosts) -> String {
        let host = hosts.canonicalize(&self.host);
        format!("git://{}/{}/{}.git", host.web_host(), self.owner, self.repo)
    }

    /// Returns the URL for cloning the repository over SSH
    #[must_use]
    pub fn ssh_url(&self, hosts: &KnownHosts) -> String {
        let host = hosts.canonicalize(&self.host);
        format!("git@{}:{}/{}.git", host.web_host(), self.owner, self.repo)
    }
}

impl FromStr for RepoRef {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_url(s)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_url(crate::default_parser().hosts()))
    }
}
