//! Generic grammar for hosts with no known browse-URL convention.
//!
//! Only whole-repository URLs of the form `https://host/{owner}/{repo}` are
//! accepted. This is the grammar applied when a caller forces a provider
//! override for a host that autodetection would misclassify.

use url::Url;

use crate::error::{LocatorError, Result};
use crate::giturl::Provider;
use crate::providers::{invalid, prep, Parsed};

const PROVIDER: Provider = Provider::Generic;

pub(crate) fn parse(url: &Url) -> Result<Parsed> {
    let prepped = prep(url, "");
    if prepped.hostname().is_empty() {
        return Err(invalid(PROVIDER, "a host is required".to_owned()));
    }

    let slug = prepped.repo_slug(PROVIDER)?;
    if prepped.segments().len() > 2 {
        return Err(invalid(
            PROVIDER,
            format!(
                "no browse-URL convention is known for this host, only `owner/repo` paths \
                 are accepted, but got `{}`",
                prepped.segments().join("/")
            ),
        ));
    }

    Ok(Parsed {
        repo: prepped.repo_url(&slug),
        version: String::new(),
        sub_path: "/".to_owned(),
    })
}

/// There is no raw endpoint convention for unknown hosts.
pub(crate) fn raw(_repo: &Url, _version: &str, _sub_path: &str) -> Result<Url> {
    Err(LocatorError::NoRawUrl {
        provider: PROVIDER,
        reason: "no raw content endpoint is known for this host".to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_only() {
        let p = parse(&"https://git.example.com/owner/repo.git".parse().unwrap()).unwrap();
        assert_eq!(p.repo.as_str(), "https://git.example.com/owner/repo");
        assert_eq!(p.version, "");
        assert_eq!(p.sub_path, "/");
    }

    #[test]
    fn browse_paths_are_rejected() {
        let err = parse(&"https://git.example.com/owner/repo/blob/main/x".parse().unwrap());
        assert!(matches!(
            err,
            Err(LocatorError::InvalidProviderUrl { .. })
        ));
    }
}
