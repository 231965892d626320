//! GitHub URL grammar.
//!
//! Recognized forms:
//!
//! - Browse: `https://github.com/{owner}/{repo}/blob/{ref}/{path}`
//! - Tree: `https://github.com/{owner}/{repo}/tree/{ref}[/{path}]`
//! - Raw: `https://raw.githubusercontent.com/{owner}/{repo}[/refs/{kind}]/{ref}/{path}`
//! - Repo: `https://github.com/{owner}/{repo}`

use url::Url;

use crate::error::{LocatorError, Result};
use crate::giturl::Provider;
use crate::providers::{invalid, prep, raw_preconditions, version_or_head, Parsed};

const DEFAULT_HOST: &str = "github.com";
const RAW_HOST: &str = "raw.githubusercontent.com";

const PROVIDER: Provider = Provider::GitHub;

pub(crate) fn parse(url: &Url) -> Result<Parsed> {
    let prepped = prep(url, DEFAULT_HOST);
    let is_raw = prepped.hostname().starts_with("raw");

    let slug = prepped.repo_slug(PROVIDER)?;
    let repo = prepped.repo_url(&slug);
    let parts = prepped.segments();

    if parts.len() == 2 {
        if is_raw {
            return Err(invalid(
                PROVIDER,
                format!("expected a raw content URL path to contain a ref, but got `{slug}`"),
            ));
        }

        // entire repo
        return Ok(Parsed {
            repo,
            version: String::new(),
            sub_path: "/".to_owned(),
        });
    }

    let mut parts = &parts[2..];

    let version;
    let mut is_tree = false;

    if is_raw {
        match parts[0].to_lowercase().as_str() {
            "refs" => {
                // e.g. refs/heads/{ref}/{path}: the middle segment
                // (heads, remotes, tags) is skipped
                if parts.len() < 3 {
                    return Err(invalid(
                        PROVIDER,
                        format!(
                            "expected a raw content URL path to contain at least 3 segments \
                             after the repository, but got `{}`",
                            parts.join("/")
                        ),
                    ));
                }
                version = parts[2].clone();
                parts = &parts[3..];
            }
            "blob" | "tree" => {
                // not sure how github behaves with a branch actually called
                // "blob" or "tree"...
                return Err(invalid(
                    PROVIDER,
                    format!(
                        "expected a raw content URL path to contain `refs` or a ref, but got `{}`",
                        parts[0]
                    ),
                ));
            }
            _ => {
                if parts.len() < 2 {
                    return Err(invalid(
                        PROVIDER,
                        format!(
                            "expected a raw content URL path to contain a ref and a file, \
                             but got `{}`",
                            parts.join("/")
                        ),
                    ));
                }
                version = parts[0].clone();
                parts = &parts[1..];
            }
        }
    } else {
        if parts.len() < 2 {
            return Err(invalid(
                PROVIDER,
                format!(
                    "expected the URL path to contain a ref after `blob` or `tree`, but got `{}`",
                    parts.join("/")
                ),
            ));
        }
        match parts[0].to_lowercase().as_str() {
            "blob" => {}
            "tree" => is_tree = true,
            other => {
                return Err(invalid(
                    PROVIDER,
                    format!("expected the URL path to contain `blob` or `tree`, but got `{other}`"),
                ));
            }
        }
        version = parts[1].clone();
        parts = &parts[2..];
    }

    let sub_path = if parts.is_empty() {
        if !is_tree {
            return Err(invalid(
                PROVIDER,
                "expected the URL path to point at a file".to_owned(),
            ));
        }
        "/".to_owned()
    } else {
        parts.join("/")
    };

    Ok(Parsed {
        repo,
        version,
        sub_path,
    })
}

/// Synthesizes the `raw.githubusercontent.com` URL for a parsed triple.
///
/// For GitHub Enterprise there is no way to guess the raw-content host:
/// this only works for repositories hosted on github.com.
pub(crate) fn raw(repo: &Url, version: &str, sub_path: &str) -> Result<Url> {
    let path = raw_preconditions(PROVIDER, repo, sub_path)?;
    let version = version_or_head(version);

    let host = repo.host_str().unwrap_or_default();
    if host != DEFAULT_HOST && host != RAW_HOST {
        return Err(LocatorError::NoRawUrl {
            provider: PROVIDER,
            reason: format!(
                "no way to guess the raw content host for github not hosted by github.com: `{host}`"
            ),
        });
    }

    format!("https://{RAW_HOST}{}/{version}/{path}", repo.path())
        .parse()
        .map_err(LocatorError::InvalidUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> Parsed {
        parse(&input.parse().unwrap()).unwrap()
    }

    #[test]
    fn browse_url() {
        let p = parsed("https://github.com/fredbi/go-vcsfetch/blob/master/README.md");
        assert_eq!(p.repo.as_str(), "https://github.com/fredbi/go-vcsfetch");
        assert_eq!(p.version, "master");
        assert_eq!(p.sub_path, "README.md");
    }

    #[test]
    fn tree_url_defaults_to_root() {
        let p = parsed("https://github.com/fredbi/go-vcsfetch/tree/v0.1.0");
        assert_eq!(p.version, "v0.1.0");
        assert_eq!(p.sub_path, "/");
    }

    #[test]
    fn tree_url_with_directory() {
        let p = parsed("https://github.com/fredbi/go-vcsfetch/tree/master/internal/git");
        assert_eq!(p.sub_path, "internal/git");
    }

    #[test]
    fn repo_only() {
        let p = parsed("https://github.com/fredbi/go-vcsfetch.git");
        assert_eq!(p.repo.as_str(), "https://github.com/fredbi/go-vcsfetch");
        assert_eq!(p.version, "");
        assert_eq!(p.sub_path, "/");
    }

    #[test]
    fn raw_url_with_refs() {
        let p = parsed("https://raw.githubusercontent.com/fredbi/go-vcsfetch/refs/heads/master/README.md");
        assert_eq!(
            p.repo.as_str(),
            "https://raw.githubusercontent.com/fredbi/go-vcsfetch"
        );
        assert_eq!(p.version, "master");
        assert_eq!(p.sub_path, "README.md");
    }

    #[test]
    fn raw_url_with_bare_ref() {
        let p = parsed("https://raw.githubusercontent.com/fredbi/go-vcsfetch/master/README.md");
        assert_eq!(p.version, "master");
        assert_eq!(p.sub_path, "README.md");
    }

    #[test]
    fn raw_url_requires_a_file() {
        let err = parse(
            &"https://raw.githubusercontent.com/fredbi/go-vcsfetch"
                .parse()
                .unwrap(),
        );
        assert!(matches!(
            err,
            Err(LocatorError::InvalidProviderUrl { .. })
        ));
    }

    #[test]
    fn blob_requires_a_file() {
        let err = parse(&"https://github.com/fredbi/go-vcsfetch/blob/master".parse().unwrap());
        assert!(matches!(err, Err(LocatorError::InvalidProviderUrl { .. })));
    }

    #[test]
    fn raw_rewrites_host() {
        let p = parsed("https://github.com/fredbi/go-vcsfetch/blob/master/README.md");
        let raw = raw(&p.repo, &p.version, &p.sub_path).unwrap();
        assert_eq!(
            raw.as_str(),
            "https://raw.githubusercontent.com/fredbi/go-vcsfetch/master/README.md"
        );
    }

    #[test]
    fn raw_defaults_to_head() {
        let repo: Url = "https://github.com/fredbi/go-vcsfetch".parse().unwrap();
        let raw = raw(&repo, "", "LICENSE").unwrap();
        assert_eq!(
            raw.as_str(),
            "https://raw.githubusercontent.com/fredbi/go-vcsfetch/HEAD/LICENSE"
        );
    }

    #[test]
    fn raw_rejects_enterprise_hosts() {
        let repo: Url = "https://github.enterprise.example.com/owner/repo".parse().unwrap();
        let err = raw(&repo, "main", "README.md");
        assert!(matches!(err, Err(LocatorError::NoRawUrl { .. })));
    }

    #[test]
    fn raw_rejects_non_https() {
        let repo: Url = "ssh://git@github.com/owner/repo".parse().unwrap();
        let err = raw(&repo, "main", "README.md");
        assert!(matches!(err, Err(LocatorError::NoRawUrl { .. })));
    }

    #[test]
    fn raw_rejects_non_standard_port() {
        let repo: Url = "git+https://github.com:8443/owner/repo".parse().unwrap();
        let err = raw(&repo, "main", "README.md");
        assert!(matches!(err, Err(LocatorError::NoRawUrl { .. })));
    }
}
