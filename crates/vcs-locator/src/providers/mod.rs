//! Per-provider URL path grammars.
//!
//! Each provider module exposes `parse`, turning a browse URL into the
//! canonical `(repo_url, version, sub_path)` triple, and `raw`, synthesizing
//! the provider's raw-content HTTPS endpoint for a parsed triple.

use url::Url;

use crate::error::{LocatorError, Result};
use crate::giturl::Provider;

pub(crate) mod bitbucket;
pub(crate) mod generic;
pub(crate) mod gitea;
pub(crate) mod github;
pub(crate) mod gitlab;

/// Canonical triple produced by every provider parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Parsed {
    pub repo: Url,
    pub version: String,
    pub sub_path: String,
}

/// URL components after the preprocessing shared by all providers: the
/// `<tool>+` scheme prefix is stripped, an absent host falls back to the
/// provider's canonical host (preserving any explicit port), and the host is
/// lowercased.
pub(crate) struct Prepped {
    scheme: String,
    auth: String,
    host: String,
    segments: Vec<String>,
}

pub(crate) fn prep(url: &Url, default_host: &str) -> Prepped {
    let scheme = match url.scheme().split_once('+') {
        Some((_, transport)) if !transport.is_empty() => transport.to_owned(),
        _ => url.scheme().to_owned(),
    };

    let mut auth = String::new();
    if !url.username().is_empty() || url.password().is_some() {
        auth.push_str(url.username());
        if let Some(password) = url.password() {
            auth.push(':');
            auth.push_str(password);
        }
        auth.push('@');
    }

    let hostname = url.host_str().unwrap_or_default().to_lowercase();
    let mut host = if hostname.is_empty() {
        default_host.to_owned()
    } else {
        hostname
    };
    if let Some(port) = url.port() {
        host.push(':');
        host.push_str(&port.to_string());
    }

    let segments = url
        .path()
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Prepped {
        scheme,
        auth,
        host,
        segments,
    }
}

impl Prepped {
    pub(crate) fn hostname(&self) -> &str {
        self.host.split(':').next().unwrap_or_default()
    }

    pub(crate) fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The `owner/repo` slug from the first two path segments, with a
    /// trailing `.git` stripped from the repository segment.
    pub(crate) fn repo_slug(&self, provider: Provider) -> Result<String> {
        if self.segments.len() < 2 {
            return Err(LocatorError::InvalidProviderUrl {
                provider,
                reason: format!(
                    "expected the URL path to contain at least 2 segments, but got {:?}",
                    self.segments.join("/")
                ),
            });
        }
        let repo = &self.segments[1];
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        Ok(format!("{}/{}", self.segments[0], repo))
    }

    /// Rebuilds the repository base URL (no query, no fragment) for a slug.
    pub(crate) fn repo_url(&self, slug: &str) -> Url {
        format!("{}://{}{}/{}", self.scheme, self.auth, self.host, slug)
            .parse()
            .expect("URL failed to parse")
    }
}

/// Removes a leading `/` from a sub-path, except when it is the sole
/// character (the repository root).
pub(crate) fn normalize_sub_path(sub_path: &str) -> String {
    let trimmed = sub_path.trim_start_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Gate shared by all raw-content URL synthesizers: the transport (after
/// stripping a `git+` tool prefix) must be https on the standard port, and
/// the sub-path must point at an actual file.
pub(crate) fn raw_preconditions<'p>(
    provider: Provider,
    repo: &Url,
    sub_path: &'p str,
) -> Result<&'p str> {
    let path = sub_path.trim_matches('/');
    if path.is_empty() {
        return Err(LocatorError::NoRawUrl {
            provider,
            reason: "a non-empty path to a file is required".into(),
        });
    }

    let scheme = repo.scheme().strip_prefix("git+").unwrap_or(repo.scheme());
    if scheme != "https" {
        return Err(LocatorError::NoRawUrl {
            provider,
            reason: "a https URL scheme is required".into(),
        });
    }

    if let Some(port) = repo.port() {
        if port != 443 {
            return Err(LocatorError::NoRawUrl {
                provider,
                reason: "a standard https port (443 or unspecified) is required".into(),
            });
        }
    }

    Ok(path)
}

pub(crate) fn version_or_head(version: &str) -> &str {
    if version.is_empty() {
        "HEAD"
    } else {
        version
    }
}

pub(crate) fn invalid(provider: Provider, reason: impl Into<String>) -> LocatorError {
    LocatorError::InvalidProviderUrl {
        provider,
        reason: reason.into(),
    }
}
