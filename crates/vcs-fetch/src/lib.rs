//! Read-only retrieval of source artifacts from git-based version control
//! hosts.
//!
//! Two operations are exposed, each addressable either by a standardized
//! SPDX download-location URL (`<tool>+<transport>://host/path@ref#subpath`)
//! or by a platform browse URL (GitHub, GitLab, Gitea, Bitbucket):
//!
//! - [`Fetcher`] retrieves a single file and streams it into a sink;
//! - [`Cloner`] clones a repository (optionally sparsely) and serves files
//!   out of the clone.
//!
//! Neither requires an external binary, but retrieval opportunistically
//! takes faster paths when available: a direct HTTPS GET against the
//! provider's raw-content endpoint, or a local git executable streaming a
//! `git archive`.
//!
//! # Example
//!
//! ```no_run
//! use vcs_fetch::Fetcher;
//!
//! # async fn example() -> vcs_fetch::Result<()> {
//! let fetcher = Fetcher::new();
//! let mut license: Vec<u8> = Vec::new();
//! fetcher
//!     .fetch(&mut license, "https://github.com/fredbi/go-vcsfetch@HEAD#LICENSE")
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Versions
//!
//! The ref part of a location may name a branch, a tag, or an incomplete
//! semver constraint: `v2` resolves to the latest `2.x.y` tag and `v2.1` to
//! the latest `2.1.y` tag. Pre-release tags are skipped unless explicitly
//! allowed. An empty ref resolves to the head of the default branch. See
//! [`FetcherOpts`](crate::FetcherOpts) for the resolution knobs.
//!
//! # Cancellation
//!
//! All operations are plain futures: dropping one aborts its pending I/O,
//! and the native-archive path kills and reaps its git subprocess.

mod capabilities;
mod cloner;
mod error;
mod fetcher;
mod native;
mod options;
mod refs;
mod repository;
mod scratch;
mod tree;

pub use cloner::Cloner;
pub use error::{Result, VcsError};
pub use fetcher::Fetcher;
pub use options::{ClonerOpts, FetcherOpts};
pub use tree::CloneTree;

pub use vcs_client::{RawClient, RawClientError, RawOpts};
pub use vcs_locator::{
    GitLocator, GitUrlOpts, Locate, LocatorError, Provider, SpdxLocator, SpdxOpts,
};
