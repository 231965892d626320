//! URL grammars for addressing a file (or subtree) at a version inside a
//! git-hosted repository.
//!
//! Two grammars are supported, both reduced to the same canonical triple
//! `(repo_url, version, sub_path)`:
//!
//! - [`SpdxLocator`] parses SPDX download-location URLs such as
//!   `git+https://github.com/user/repo@v1.0.0#README.md`, where the `@`
//!   carries the ref and the fragment carries the file path.
//! - [`GitLocator`] parses the browse URLs of well-known SCM platforms
//!   (GitHub, GitLab, Gitea, Bitbucket), e.g.
//!   `https://github.com/user/repo/blob/main/README.md`, dispatching on the
//!   host to the right per-provider path grammar.
//!
//! Both implement the [`Locate`] trait, the seam consumed by fetching code.
//! Callers with special addressing requirements may bring their own
//! [`Locate`] implementation.

use std::fmt;

use url::Url;

mod error;
mod giturl;
mod providers;
mod spdx;

pub use error::{LocatorError, Result};
pub use giturl::{auto_detect, raw_url, GitLocator, Provider};
pub use spdx::SpdxLocator;

/// Types that know how to address a vcs resource.
///
/// A locator resolves to a repository URL, a ref (possibly empty, meaning the
/// head of the default branch) and a repository-relative path, `/` denoting
/// the repository root.
pub trait Locate: fmt::Display + fmt::Debug {
    /// Base URL of the vcs repository, e.g. `https://github.com/user/repo`.
    ///
    /// The returned URL carries no query and no fragment, and its path
    /// contains neither `@` nor `#`.
    fn repo_url(&self) -> Url;

    /// Ref identifying the desired version, e.g. `v0.0.1`. Empty when the
    /// location does not pin a version.
    fn version(&self) -> &str;

    /// File path relative to the repository, e.g. `internal/git/api.rs`.
    fn sub_path(&self) -> &str;

    /// Whether the repository is local, e.g. `file://...`.
    fn is_local(&self) -> bool;

    /// Whether the locator embeds credentials (a password in userinfo).
    fn has_auth(&self) -> bool;
}

/// Options for parsing [`SpdxLocator`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpdxOpts {
    pub(crate) require_version: bool,
    pub(crate) root_url: Option<Url>,
}

impl SpdxOpts {
    pub fn new() -> Self {
        Default::default()
    }

    /// Reject locations that do not carry an explicit version. By default an
    /// absent version resolves to the head of the default branch.
    pub fn require_version(mut self, required: bool) -> Self {
        self.require_version = required;
        self
    }

    /// URL prepended to "slug-like" abbreviated locations, e.g. with root
    /// `https://github.com`, `user/repo@HEAD#README.md` resolves against
    /// GitHub.
    ///
    /// # Panics
    ///
    /// Panics when given a string that is not a valid URL.
    pub fn root_url<U>(mut self, root: U) -> Self
    where
        U: TryInto<Url>,
        U::Error: fmt::Display,
    {
        match root.try_into() {
            Ok(url) => self.root_url = Some(url),
            Err(e) => panic!("invalid root URL passed as locator option: {e}"),
        }
        self
    }
}

/// Options for parsing [`GitLocator`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitUrlOpts {
    pub(crate) require_version: bool,
    pub(crate) root_url: Option<Url>,
    pub(crate) provider: Option<Provider>,
}

impl GitUrlOpts {
    pub fn new() -> Self {
        Default::default()
    }

    /// Reject locations that do not carry an explicit version. By default an
    /// absent version resolves to the head of the default branch.
    pub fn require_version(mut self, required: bool) -> Self {
        self.require_version = required;
        self
    }

    /// URL prepended to "slug-like" abbreviated locations, e.g. with root
    /// `https://gitlab.com`, `user/repo/-/blob/main/README.md` resolves
    /// against GitLab. Defaults to `https://github.com`.
    ///
    /// # Panics
    ///
    /// Panics when given a string that is not a valid URL.
    pub fn root_url<U>(mut self, root: U) -> Self
    where
        U: TryInto<Url>,
        U::Error: fmt::Display,
    {
        match root.try_into() {
            Ok(url) => self.root_url = Some(url),
            Err(e) => panic!("invalid root URL passed as locator option: {e}"),
        }
        self
    }

    /// Force a specific provider grammar instead of autodetecting from the
    /// host. Useful for self-hosted instances whose domain does not contain
    /// the provider name, or contains the wrong one.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }
}
