use url::Url;

use crate::error::{DepBumpError, Result};

/// Hosting coordinates of a repository, derived from its remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepoInfo {
    /// Parse a remote URL into host, owner and repository name
    ///
    /// Handles scp-like SSH (`git@host:owner/name.git`) as well as
    /// `ssh://`, `https://` and `http://` URLs, with or without credentials,
    /// port or `.git` suffix.
    pub fn from_remote_url(remote_url: &str) -> Result<Self> {
        let trimmed = remote_url.trim();

        let parsed = if trimmed.contains("://") {
            Self::parse_url(trimmed)
        } else {
            Self::parse_scp_like(trimmed)
        };

        parsed.ok_or_else(|| {
            DepBumpError::version_control(format!(
                "cannot determine owner/name from remote URL '{}'",
                remote_url
            ))
        })
    }

    fn parse_url(remote_url: &str) -> Option<Self> {
        let url = Url::parse(remote_url).ok()?;
        if !matches!(url.scheme(), "https" | "http" | "ssh" | "git") {
            return None;
        }

        let host = url.host_str()?.to_string();
        let (owner, name) = split_owner_and_name(url.path())?;

        Some(RepoInfo { host, owner, name })
    }

    fn parse_scp_like(remote_url: &str) -> Option<Self> {
        let (user_host, path) = remote_url.split_once(':')?;
        if user_host.contains('/') {
            // A local path such as ./repo:with-colon
            return None;
        }

        let host = user_host.rsplit('@').next()?;
        if host.is_empty() {
            return None;
        }

        let (owner, name) = split_owner_and_name(path)?;

        Some(RepoInfo {
            host: host.to_string(),
            owner,
            name,
        })
    }
}

fn split_owner_and_name(path: &str) -> Option<(String, String)> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut parts = path.split('/').filter(|part| !part.is_empty());
    let owner = parts.next()?;
    let name = parts.next()?;

    Some((owner.to_string(), name.to_string()))
}
