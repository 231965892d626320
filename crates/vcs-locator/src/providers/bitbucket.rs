//! Bitbucket URL grammar.
//!
//! Recognized forms:
//!
//! - Browse: `https://bitbucket.org/{workspace}/{repo}/src/{ref}[/{path}]`
//! - Raw: `https://bitbucket.org/{workspace}/{repo}/raw/{ref}/{path}`
//! - Repo: `https://bitbucket.org/{workspace}/{repo}`
//!
//! Unlike gitea, there is no branch/tag/commit discriminator: the ref
//! follows `src` or `raw` directly.

use url::Url;

use crate::error::Result;
use crate::giturl::Provider;
use crate::providers::{invalid, prep, raw_preconditions, version_or_head, Parsed};

const DEFAULT_HOST: &str = "bitbucket.org";

const PROVIDER: Provider = Provider::Bitbucket;

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

    if parts.is_empty() {
        return Err(invalid(
            PROVIDER,
            "expected the URL path to contain a ref name".to_owned(),
        ));
    }

    let version = parts[0].clone();
    parts = &parts[1..];

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

/// Synthesizes the `/raw/` URL for a parsed triple. This works on
/// bitbucket.org and on Bitbucket Server instances reachable over standard
/// https.
pub(crate) fn raw(repo: &Url, version: &str, sub_path: &str) -> Result<Url> {
    let path = raw_preconditions(PROVIDER, repo, sub_path)?;
    let version = version_or_head(version);

    format!(
        "{}/raw/{version}/{path}",
        repo.as_str().trim_end_matches('/')
    )
    .parse()
    .map_err(crate::LocatorError::InvalidUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> Parsed {
        parse(&input.parse().unwrap()).unwrap()
    }

    #[test]
    fn browse_url() {
        let p = parsed("https://bitbucket.org/workspace/repo/src/v1.0.0/LICENSE");
        assert_eq!(p.repo.as_str(), "https://bitbucket.org/workspace/repo");
        assert_eq!(p.version, "v1.0.0");
        assert_eq!(p.sub_path, "LICENSE");
    }

    #[test]
    fn directory_view_defaults_to_root() {
        let p = parsed("https://bitbucket.org/workspace/repo/src/main");
        assert_eq!(p.version, "main");
        assert_eq!(p.sub_path, "/");
    }

    #[test]
    fn raw_requires_a_file() {
        let err = parse(&"https://bitbucket.org/workspace/repo/raw/main".parse().unwrap());
        assert!(matches!(
            err,
            Err(crate::LocatorError::InvalidProviderUrl { .. })
        ));
    }

    #[test]
    fn raw_url_synthesis() {
        let p = parsed("https://bitbucket.org/workspace/repo/src/v1.0.0/LICENSE");
        let raw = raw(&p.repo, &p.version, &p.sub_path).unwrap();
        assert_eq!(
            raw.as_str(),
            "https://bitbucket.org/workspace/repo/raw/v1.0.0/LICENSE"
        );
    }
}
