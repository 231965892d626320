//! Configuration builders for the [`Fetcher`](crate::Fetcher) and the
//! [`Cloner`](crate::Cloner).

use std::path::PathBuf;

use vcs_client::{RawClient, RawOpts};
use vcs_locator::{GitUrlOpts, SpdxOpts};

use crate::cloner::Cloner;
use crate::fetcher::Fetcher;
use crate::refs::RefPolicy;
use crate::scratch::ScratchFactory;

/// Immutable configuration shared by retrieval handles.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) factory: ScratchFactory,
    pub(crate) skip_autodetect: bool,
    pub(crate) policy: RefPolicy,
    pub(crate) require_version: bool,
    pub(crate) skip_raw_url: bool,
    #[allow(dead_code)]
    pub(crate) recurse_submodules: bool,
    pub(crate) client: RawClient,
    pub(crate) spdx: SpdxOpts,
    pub(crate) git_url: GitUrlOpts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            factory: ScratchFactory::Memory,
            skip_autodetect: false,
            policy: RefPolicy::default(),
            require_version: false,
            skip_raw_url: false,
            recurse_submodules: false,
            client: RawClient::default(),
            spdx: SpdxOpts::default(),
            git_url: GitUrlOpts::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
enum Backing {
    #[default]
    Memory,
    Filesystem(Option<PathBuf>),
}

impl Backing {
    fn choose(enabled: bool, dir: Option<PathBuf>) -> Self {
        if enabled {
            Backing::Filesystem(dir)
        } else {
            Backing::Memory
        }
    }

    fn into_factory(self) -> ScratchFactory {
        match self {
            Backing::Memory => ScratchFactory::Memory,
            Backing::Filesystem(dir) => ScratchFactory::filesystem(dir),
        }
    }
}

/// Build a new [`Fetcher`] with specified options.
#[derive(Debug, Clone, Default)]
pub struct FetcherOpts {
    backing: Backing,
    skip_autodetect: bool,
    exact_tag: bool,
    allow_prereleases: bool,
    require_version: bool,
    recurse_submodules: bool,
    skip_raw_url: bool,
    raw: RawOpts,
    spdx: SpdxOpts,
    git_url: GitUrlOpts,
}

impl FetcherOpts {
    pub fn new() -> Self {
        Default::default()
    }

    /// Back fetched resources on disk instead of the default in-memory-like
    /// ephemeral store.
    ///
    /// With no explicit directory, a `vcsclone`-prefixed directory is
    /// created under the platform temp root, owned by the handle and
    /// removed with it; building the options panics if it cannot be
    /// created. An explicit directory is pre-cleaned on every operation and
    /// never removed by this library.
    pub fn backing_dir(mut self, enabled: bool, dir: Option<PathBuf>) -> Self {
        self.backing = Backing::choose(enabled, dir);
        self
    }

    /// Skip the autodetection of a local git binary. Autodetection lets
    /// some operations run faster through the native git implementation
    /// rather than the in-process one.
    pub fn skip_autodetect(mut self, skipped: bool) -> Self {
        self.skip_autodetect = skipped;
        self
    }

    /// Match tag references exactly.
    ///
    /// By default an incomplete version tag resolves to the latest matching
    /// semver tag: `v2` looks for the latest `v2.x.y`, `v2.1` for the
    /// latest `v2.1.y`. With exact matching there is no semver completion
    /// and no pre-release filtering.
    pub fn exact_tag(mut self, exact: bool) -> Self {
        self.exact_tag = exact;
        self
    }

    /// Include pre-releases in semver tag resolution. Ignored under
    /// [`FetcherOpts::exact_tag`]; implied when the ref spec itself carries
    /// a pre-release suffix.
    pub fn allow_prereleases(mut self, allowed: bool) -> Self {
        self.allow_prereleases = allowed;
        self
    }

    /// Require fetched locations to carry an explicit version; no default
    /// to `HEAD` is applied.
    pub fn require_version(mut self, required: bool) -> Self {
        self.require_version = required;
        self
    }

    /// Resolve submodules when fetching. Declared for forward
    /// compatibility: submodule recursion is not implemented yet and this
    /// option currently has no effect.
    pub fn recurse_submodules(mut self, enabled: bool) -> Self {
        self.recurse_submodules = enabled;
        self
    }

    /// Disable the short-circuit that downloads from a provider raw-content
    /// URL instead of going through git.
    pub fn skip_raw_url(mut self, skipped: bool) -> Self {
        self.skip_raw_url = skipped;
        self
    }

    /// HTTP options (timeout, basic auth, headers, custom client) for the
    /// raw-content short-circuit.
    pub fn raw_opts(mut self, opts: RawOpts) -> Self {
        self.raw = opts;
        self
    }

    /// Parsing options applied to SPDX locators.
    pub fn spdx_opts(mut self, opts: SpdxOpts) -> Self {
        self.spdx = opts;
        self
    }

    /// Parsing options applied to provider (git-url) locators.
    pub fn git_url_opts(mut self, opts: GitUrlOpts) -> Self {
        self.git_url = opts;
        self
    }

    pub fn build(self) -> Fetcher {
        Fetcher::with_config(Config {
            factory: self.backing.into_factory(),
            skip_autodetect: self.skip_autodetect,
            policy: RefPolicy {
                exact_tag: self.exact_tag,
                allow_prereleases: self.allow_prereleases,
            },
            require_version: self.require_version,
            skip_raw_url: self.skip_raw_url,
            recurse_submodules: self.recurse_submodules,
            client: self.raw.build(),
            spdx: self.spdx,
            git_url: self.git_url,
        })
    }
}

/// Build a new [`Cloner`] with specified options.
#[derive(Debug, Clone, Default)]
pub struct ClonerOpts {
    backing: Backing,
    skip_autodetect: bool,
    exact_tag: bool,
    allow_prereleases: bool,
    require_version: bool,
    recurse_submodules: bool,
    sparse_filter: Vec<String>,
    raw: RawOpts,
    spdx: SpdxOpts,
    git_url: GitUrlOpts,
}

impl ClonerOpts {
    pub fn new() -> Self {
        Default::default()
    }

    /// Back cloned resources on disk instead of the default in-memory-like
    /// ephemeral store. See [`FetcherOpts::backing_dir`] for directory
    /// ownership rules.
    pub fn backing_dir(mut self, enabled: bool, dir: Option<PathBuf>) -> Self {
        self.backing = Backing::choose(enabled, dir);
        self
    }

    /// Skip the autodetection of a local git binary.
    pub fn skip_autodetect(mut self, skipped: bool) -> Self {
        self.skip_autodetect = skipped;
        self
    }

    /// Match tag references exactly. See [`FetcherOpts::exact_tag`].
    pub fn exact_tag(mut self, exact: bool) -> Self {
        self.exact_tag = exact;
        self
    }

    /// Include pre-releases in semver tag resolution.
    pub fn allow_prereleases(mut self, allowed: bool) -> Self {
        self.allow_prereleases = allowed;
        self
    }

    /// Require cloned locations to carry an explicit version.
    pub fn require_version(mut self, required: bool) -> Self {
        self.require_version = required;
        self
    }

    /// Resolve submodules when cloning. Declared for forward compatibility:
    /// submodule recursion is not implemented yet and this option currently
    /// has no effect.
    pub fn recurse_submodules(mut self, enabled: bool) -> Self {
        self.recurse_submodules = enabled;
        self
    }

    /// Restrict the clone checkout to the given directories or files.
    pub fn sparse_filter(mut self, filter: impl IntoIterator<Item = String>) -> Self {
        self.sparse_filter.extend(filter);
        self
    }

    /// HTTP options for provider raw-content round-trips.
    pub fn raw_opts(mut self, opts: RawOpts) -> Self {
        self.raw = opts;
        self
    }

    /// Parsing options applied to SPDX locators.
    pub fn spdx_opts(mut self, opts: SpdxOpts) -> Self {
        self.spdx = opts;
        self
    }

    /// Parsing options applied to provider (git-url) locators.
    pub fn git_url_opts(mut self, opts: GitUrlOpts) -> Self {
        self.git_url = opts;
        self
    }

    pub fn build(self) -> Cloner {
        Cloner::with_config(
            Config {
                factory: self.backing.into_factory(),
                skip_autodetect: self.skip_autodetect,
                policy: RefPolicy {
                    exact_tag: self.exact_tag,
                    allow_prereleases: self.allow_prereleases,
                },
                require_version: self.require_version,
                skip_raw_url: false,
                recurse_submodules: self.recurse_submodules,
                client: self.raw.build(),
                spdx: self.spdx,
                git_url: self.git_url,
            },
            self.sparse_filter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_disabled_is_memory() {
        let backing = Backing::choose(false, Some(PathBuf::from("/ignored")));
        assert!(matches!(backing, Backing::Memory));
    }

    #[test]
    fn backing_enabled_keeps_the_explicit_dir() {
        let backing = Backing::choose(true, Some(PathBuf::from("/data/clones")));
        assert!(matches!(backing, Backing::Filesystem(Some(_))));
    }
}
