//! Gitea URL grammar.
//!
//! Recognized forms:
//!
//! - Browse: `https://gitea.com/{owner}/{repo}/src/{branch|tag|commit}/{ref}[/{path}]`
//! - Raw: `https://gitea.com/{owner}/{repo}/raw/{branch|tag|commit}/{ref}/{path}`
//! - Repo: `https://gitea.com/{owner}/{repo}`

use url::Url;

use crate::error::Result;
use crate::giturl::Provider;
use crate::providers::{invalid, prep, raw_preconditions, version_or_head, Parsed};

const DEFAULT_HOST: &str = "gitea.com";

const PROVIDER: Provider = Provider::Gitea;

pub(crate) fn parse(url: &Url) -> Result<Parsed> {
    let prepped = prep(url, DEFAULT_HOST);

    let slug = prepped.repo_slug(PROVIDER)?;
    let repo = prepped.repo_url(&slug);
    let parts = prepped.segments();

    if parts.len() == 2 {
        // entire repo
        return Ok(Parsed {
            repo,
            version: String::new(),
            sub_path: "/".to_owned(),
        });
    }

    let mut parts = &parts[2..];

    let is_raw = match parts[0].to_lowercase().as_str() {
        "src" => false,
        "raw" => true,
        other => {
            return Err(invalid(
                PROVIDER,
                format!("expected the URL path to contain `src` or `raw`, but got `{other}`"),
            ));
        }
    };
    parts = &parts[1..];

    if parts.len() < 2 {
        return Err(invalid(
            PROVIDER,
            format!(
                "expected the URL path to contain a ref type and a ref name, but got `{}`",
                parts.join("/")
            ),
        ));
    }

    match parts[0].to_lowercase().as_str() {
        "branch" | "tag" | "commit" => {}
        other => {
            return Err(invalid(
                PROVIDER,
                format!(
                    "expected the URL path to contain `branch`, `tag` or `commit`, but got `{other}`"
                ),
            ));
        }
    }
    let version = parts[1].clone();
    parts = &parts[2..];

    let sub_path = if parts.is_empty() {
        if is_raw {
            return Err(invalid(
                PROVIDER,
                "expected the raw content URL path to point at a file".to_owned(),
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

/// Synthesizes the `/raw/branch/` URL for a parsed triple. This works on any
/// Gitea instance reachable over standard https.
pub(crate) fn raw(repo: &Url, version: &str, sub_path: &str) -> Result<Url> {
    let path = raw_preconditions(PROVIDER, repo, sub_path)?;
    let version = version_or_head(version);

    format!(
        "{}/raw/branch/{version}/{path}",
        repo.as_str().trim_end_matches('/')
    )
    .parse()
    .map_err(crate::LocatorError::InvalidUrl)
}
