//! GitLab URL grammar.
//!
//! Recognized forms:
//!
//! - Browse: `https://gitlab.com/{owner}/{repo}/-/blob/{ref}/{path}`
//! - Raw: `https://gitlab.com/{owner}/{repo}/-/raw/{ref}/{path}`
//! - Tree: `https://gitlab.com/{owner}/{repo}/-/tree/{ref}[/{path}]`
//! - Repo: `https://gitlab.com/{owner}/{repo}`, optionally followed by `/-`

use url::Url;

use crate::error::Result;
use crate::giturl::Provider;
use crate::providers::{invalid, prep, raw_preconditions, version_or_head, Parsed};

const DEFAULT_HOST: &str = "gitlab.com";

const PROVIDER: Provider = Provider::GitLab;

pub(crate) fn parse(url: &Url) -> Result<Parsed> {
    let prepped = prep(url, DEFAULT_HOST);

    let slug = prepped.repo_slug(PROVIDER)?;
    let repo = prepped.repo_url(&slug);
    let parts = prepped.segments();

    // `…/repo` and the degenerate `…/repo/-` both address the entire repo
    if parts.len() == 2 || (parts.len() == 3 && parts[2] == "-") {
        return Ok(Parsed {
            repo,
            version: String::new(),
            sub_path: "/".to_owned(),
        });
    }

    let mut parts = &parts[2..];
    if parts[0] != "-" {
        return Err(invalid(
            PROVIDER,
            format!(
                "expected the URL path to contain a `-` separator, but got `{}`",
                parts.join("/")
            ),
        ));
    }
    parts = &parts[1..];

    if parts.len() < 2 {
        return Err(invalid(
            PROVIDER,
            format!(
                "expected the URL path to contain a ref after the `-` separator, but got `{}`",
                parts.join("/")
            ),
        ));
    }

    let mut is_tree = false;
    match parts[0].to_lowercase().as_str() {
        "blob" | "raw" => {}
        "tree" => is_tree = true,
        other => {
            return Err(invalid(
                PROVIDER,
                format!(
                    "expected the URL path to contain `blob`, `raw` or `tree`, but got `{other}`"
                ),
            ));
        }
    }

    let version = parts[1].clone();
    parts = &parts[2..];

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

/// Synthesizes the `/-/raw/` URL for a parsed triple. This works on any
/// GitLab instance reachable over standard https.
pub(crate) fn raw(repo: &Url, version: &str, sub_path: &str) -> Result<Url> {
    let path = raw_preconditions(PROVIDER, repo, sub_path)?;
    let version = version_or_head(version);

    format!("{}/-/raw/{version}/{path}", repo.as_str().trim_end_matches('/'))
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
        let p = parsed("https://gitlab.com/fredbi/go-vcsfetch/-/blob/master/README.md");
        assert_eq!(p.repo.as_str(), "https://gitlab.com/fredbi/go-vcsfetch");
        assert_eq!(p.version, "master");
        assert_eq!(p.sub_path, "README.md");
    }

    #[test]
    fn raw_browse_url() {
        let p = parsed("https://gitlab.com/fredbi/go-vcsfetch/-/raw/v0.2.0/internal/parser.go");
        assert_eq!(p.version, "v0.2.0");
        assert_eq!(p.sub_path, "internal/parser.go");
    }

    #[test]
    fn tree_url_defaults_to_root() {
        let p = parsed("https://gitlab.com/fredbi/go-vcsfetch/-/tree/master");
        assert_eq!(p.version, "master");
        assert_eq!(p.sub_path, "/");
    }

    #[test]
    fn degenerate_dash_forms() {
        for input in [
            "https://gitlab.com/fredbi/go-vcsfetch",
            "https://gitlab.com/fredbi/go-vcsfetch/-",
            "https://gitlab.com/fredbi/go-vcsfetch/-/",
        ] {
            let p = parsed(input);
            assert_eq!(p.repo.as_str(), "https://gitlab.com/fredbi/go-vcsfetch");
            assert_eq!(p.version, "");
            assert_eq!(p.sub_path, "/");
        }
    }

    #[test]
    fn missing_dash_is_rejected() {
        let err = parse(
            &"https://gitlab.com/fredbi/go-vcsfetch/blob/master/README.md"
                .parse()
                .unwrap(),
        );
        assert!(matches!(
            err,
            Err(crate::LocatorError::InvalidProviderUrl { .. })
        ));
    }

    #[test]
    fn raw_url_synthesis() {
        let p = parsed("https://gitlab.com/fredbi/go-vcsfetch/-/blob/master/README.md");
        let raw = raw(&p.repo, &p.version, &p.sub_path).unwrap();
        assert_eq!(
            raw.as_str(),
            "https://gitlab.com/fredbi/go-vcsfetch/-/raw/master/README.md"
        );
    }

    #[test]
    fn raw_works_on_self_hosted_instances() {
        let repo: Url = "https://gitlab.example.com/group/project".parse().unwrap();
        let raw = raw(&repo, "release", "README.md").unwrap();
        assert_eq!(
            raw.as_str(),
            "https://gitlab.example.com/group/project/-/raw/release/README.md"
        );
    }
}
