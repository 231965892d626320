use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{LocatorError, Result};
use crate::providers::{self, normalize_sub_path, Parsed};
use crate::{GitUrlOpts, Locate};

const DEFAULT_ROOT: &str = "https://github.com";

/// An SCM platform with a proprietary browse-URL format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    GitHub,
    GitLab,
    Azure,
    Bitbucket,
    Gitea,
    /// Hosts with no known browse-URL convention.
    Generic,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Provider::*;
        write!(
            f,
            "{}",
            match self {
                GitHub => "github",
                GitLab => "gitlab",
                Azure => "azure",
                Bitbucket => "bitbucket",
                Gitea => "gitea",
                Generic => "generic",
            }
        )
    }
}

impl FromStr for Provider {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_lowercase().as_str() {
            "github" => Provider::GitHub,
            "gitlab" => Provider::GitLab,
            "azure" => Provider::Azure,
            "bitbucket" => Provider::Bitbucket,
            "gitea" => Provider::Gitea,
            "generic" => Provider::Generic,
            _ => return Err(LocatorError::UnknownProvider(s.to_owned())),
        })
    }
}

/// Determines the [`Provider`] that serves a given URL.
///
/// Detection is deliberately crude: it matches on host substrings, in
/// order: `github`, `gitlab`, `azure`, `bitbucket`, `gitea`. This catches
/// on-premises deployments such as `github.enterprise.example.com`, but will
/// misclassify hosts whose domain happens to contain a provider name. Use
/// [`GitUrlOpts::provider`] to override detection in that case.
pub fn auto_detect(url: &Url) -> Result<Provider> {
    let host = url.host_str().unwrap_or_default().to_lowercase();

    for provider in [
        Provider::GitHub,
        Provider::GitLab,
        Provider::Azure,
        Provider::Bitbucket,
        Provider::Gitea,
    ] {
        if host.contains(&provider.to_string()) {
            return Ok(provider);
        }
    }

    Err(LocatorError::UnknownProvider(host))
}

fn dispatch(provider: Provider, url: &Url) -> Result<Parsed> {
    match provider {
        Provider::GitHub => providers::github::parse(url),
        Provider::GitLab => providers::gitlab::parse(url),
        Provider::Bitbucket => providers::bitbucket::parse(url),
        Provider::Gitea => providers::gitea::parse(url),
        Provider::Generic => providers::generic::parse(url),
        Provider::Azure => Err(LocatorError::UnsupportedProvider(provider)),
    }
}

fn dispatch_raw(provider: Provider, repo: &Url, version: &str, sub_path: &str) -> Result<Url> {
    match provider {
        Provider::GitHub => providers::github::raw(repo, version, sub_path),
        Provider::GitLab => providers::gitlab::raw(repo, version, sub_path),
        Provider::Bitbucket => providers::bitbucket::raw(repo, version, sub_path),
        Provider::Gitea => providers::gitea::raw(repo, version, sub_path),
        Provider::Generic => providers::generic::raw(repo, version, sub_path),
        Provider::Azure => Err(LocatorError::UnsupportedProvider(provider)),
    }
}

/// Transforms a locator into the provider's raw-content URL.
///
/// This allows retrieval to bypass git entirely, which is usually faster.
/// The provider is autodetected from the locator's repository host.
pub fn raw_url(locator: &dyn Locate) -> Result<Url> {
    let repo = locator.repo_url();
    let provider = auto_detect(&repo)?;
    dispatch_raw(provider, &repo, locator.version(), locator.sub_path())
}

/// A URL used to access a vcs resource over git, using the browse-URL
/// conventions of well-known SCM platforms (github, gitlab, ...).
///
/// The URL may use the schemes `git`, `http`, `https` or `ssh`, optionally
/// prefixed with the `git+` vcs tool marker.
///
/// See <https://git-scm.com/docs/git-fetch#_git_urls> for reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLocator {
    repo: Url,
    pub provider: Provider,
    pub reference: String,
    pub sub_path: String,
}

impl GitLocator {
    /// Parses a provider browse-URL string into a [`GitLocator`].
    ///
    /// Relative forms such as `user/repo/blob/main/README.md` are expanded
    /// against [`GitUrlOpts::root_url`] (default `https://github.com`).
    pub fn parse(location: impl AsRef<str>, opts: &GitUrlOpts) -> Result<Self> {
        let location = location.as_ref();

        let url = match Url::parse(location) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let root = match &opts.root_url {
                    Some(root) => root.clone(),
                    None => Url::parse(DEFAULT_ROOT).expect("URL failed to parse"),
                };
                root.join(location)?
            }
            Err(e) => return Err(e.into()),
        };

        Self::from_url(&url, opts)
    }

    /// Parses an already-parsed URL into a [`GitLocator`].
    pub fn from_url(url: &Url, opts: &GitUrlOpts) -> Result<Self> {
        let provider = match opts.provider {
            Some(provider) => provider,
            None => auto_detect(url)?,
        };

        let parsed = dispatch(provider, url)?;
        if opts.require_version && parsed.version.is_empty() {
            return Err(LocatorError::RequireVersion(url.to_string()));
        }

        Ok(Self {
            repo: parsed.repo,
            provider,
            reference: parsed.version,
            sub_path: normalize_sub_path(&parsed.sub_path),
        })
    }

    /// The provider's raw-content URL for this locator, when one exists.
    pub fn raw(&self) -> Result<Url> {
        dispatch_raw(self.provider, &self.repo, &self.reference, &self.sub_path)
    }
}

impl Locate for GitLocator {
    fn repo_url(&self) -> Url {
        self.repo.clone()
    }

    fn version(&self) -> &str {
        &self.reference
    }

    fn sub_path(&self) -> &str {
        &self.sub_path
    }

    fn is_local(&self) -> bool {
        self.repo.scheme() == "file"
    }

    fn has_auth(&self) -> bool {
        self.repo.password().is_some()
    }
}

impl fmt::Display for GitLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repo = self.repo.as_str();
        if repo.starts_with("git+") {
            write!(f, "{repo}@{}#{}", self.reference, self.sub_path)
        } else {
            write!(f, "git+{repo}@{}#{}", self.reference, self.sub_path)
        }
    }
}

impl FromStr for GitLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, &GitUrlOpts::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_by_host_substring() {
        let detect = |url: &str| auto_detect(&url.parse().unwrap());

        assert_eq!(detect("https://github.com/a/b").unwrap(), Provider::GitHub);
        assert_eq!(
            detect("https://github.enterprise.example.com/a/b").unwrap(),
            Provider::GitHub
        );
        assert_eq!(detect("https://gitlab.com/a/b").unwrap(), Provider::GitLab);
        assert_eq!(
            detect("https://bitbucket.org/a/b").unwrap(),
            Provider::Bitbucket
        );
        assert_eq!(detect("https://try.gitea.io/a/b").unwrap(), Provider::Gitea);
        assert!(matches!(
            detect("https://example.invalid/"),
            Err(LocatorError::UnknownProvider(_))
        ));
    }

    #[test]
    fn azure_is_detected_but_unsupported() {
        let err = GitLocator::parse(
            "https://dev.azure.com/org/project/_git/repo",
            &GitUrlOpts::default(),
        );
        assert!(matches!(
            err,
            Err(LocatorError::UnsupportedProvider(Provider::Azure))
        ));
    }

    #[test]
    fn provider_override_beats_detection() {
        let opts = GitUrlOpts::new().provider(Provider::Gitea);
        let loc = GitLocator::parse(
            "https://code.company.example.com/owner/repo/src/branch/main/README.md",
            &opts,
        )
        .unwrap();
        assert_eq!(loc.provider, Provider::Gitea);
        assert_eq!(loc.version(), "main");
        assert_eq!(loc.sub_path(), "README.md");
    }

    #[test]
    fn canonical_display() {
        let loc: GitLocator = "https://github.com/fredbi/go-vcsfetch/blob/master/README.md"
            .parse()
            .unwrap();
        assert_eq!(
            loc.to_string(),
            "git+https://github.com/fredbi/go-vcsfetch@master#README.md"
        );
    }

    #[test]
    fn version_may_be_required() {
        let opts = GitUrlOpts::new().require_version(true);
        let err = GitLocator::parse("https://github.com/fredbi/go-vcsfetch", &opts);
        assert!(matches!(err, Err(LocatorError::RequireVersion(_))));
    }

    #[test]
    fn relative_slug_expands_against_default_root() {
        let loc: GitLocator = "fredbi/go-vcsfetch/blob/master/README.md".parse().unwrap();
        assert_eq!(loc.provider, Provider::GitHub);
        assert_eq!(loc.repo_url().as_str(), "https://github.com/fredbi/go-vcsfetch");
    }

    #[test]
    fn relative_slug_expands_against_configured_root() {
        let opts = GitUrlOpts::new().root_url("https://gitlab.com");
        let loc = GitLocator::parse("fredbi/go-vcsfetch/-/blob/master/README.md", &opts).unwrap();
        assert_eq!(loc.provider, Provider::GitLab);
        assert_eq!(loc.repo_url().as_str(), "https://gitlab.com/fredbi/go-vcsfetch");
    }
}
