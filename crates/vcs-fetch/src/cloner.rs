use futures::AsyncWrite;
use url::Url;
use vcs_locator::Locate;

use crate::error::{Result, VcsError};
use crate::fetcher::{classify_str, classify_url};
use crate::options::{ClonerOpts, Config};
use crate::repository::Repository;
use crate::tree::CloneTree;

/// Clones vcs repositories and serves files out of the clone.
///
/// The `Cloner` is intended for read-only capture of remote resources.
/// After a successful [`Cloner::clone`], the checked-out tree is accessible
/// through [`Cloner::tree`], and single files can be fetched with the
/// `fetch_*_from_clone` methods using the same location syntax as a
/// [`Fetcher`](crate::Fetcher). Fetched locators must address the cloned
/// repository URL or an error is returned.
///
/// # Concurrency
///
/// Unlike the fetcher, the `Cloner` is a stateful object and is not meant
/// for concurrent use: guard it with a mutex if it must be shared across
/// tasks.
///
/// Use [`Cloner::close`] to relinquish memory or temporary disk resources
/// and reuse the handle. When backed by an explicit directory, the cloned
/// content is not removed and is left to the caller.
#[derive(Debug, Default)]
pub struct Cloner {
    config: Config,
    sparse: Vec<String>,
    cloned: Option<Cloned>,
}

#[derive(Debug)]
struct Cloned {
    url: Url,
    tree: CloneTree,
}

impl Cloner {
    /// Builds a `Cloner` with default settings. To configure it, use
    /// [`ClonerOpts`].
    pub fn new() -> Self {
        ClonerOpts::new().build()
    }

    pub(crate) fn with_config(config: Config, sparse: Vec<String>) -> Self {
        Self {
            config,
            sparse,
            cloned: None,
        }
    }

    /// Clones a vcs repository from a location string, which may be a SPDX
    /// locator or a provider browse URL.
    ///
    /// Cloning again supersedes the previous clone.
    pub async fn clone(&mut self, location: impl AsRef<str>) -> Result<()> {
        let locator = classify_str(location.as_ref(), &self.config)?;
        self.clone_locator(locator.as_ref()).await
    }

    /// Clones a vcs repository from a parsed URL.
    pub async fn clone_url(&mut self, url: &Url) -> Result<()> {
        let locator = classify_url(url, &self.config)?;
        self.clone_locator(locator.as_ref()).await
    }

    /// Clones the repository addressed by a [`Locate`] implementation at
    /// its version, honoring the configured sparse filters.
    pub async fn clone_locator(&mut self, locator: &dyn Locate) -> Result<()> {
        if self.config.require_version && locator.version().is_empty() {
            return Err(VcsError::RequireVersion(locator.to_string()));
        }

        let repo_url = locator.repo_url();
        let repo = Repository::new(repo_url.clone(), self.config.clone())?;
        let tree = repo.clone_tree(locator.version(), &self.sparse).await?;

        self.cloned = Some(Cloned {
            url: repo_url,
            tree,
        });

        Ok(())
    }

    /// The checked-out tree of the last successful clone.
    pub fn tree(&self) -> Option<&CloneTree> {
        self.cloned.as_ref().map(|c| &c.tree)
    }

    /// Fetches a single file from the cloned repository by location string.
    pub async fn fetch_from_clone<W>(&self, sink: &mut W, location: impl AsRef<str>) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let locator = classify_str(location.as_ref(), &self.config)?;
        self.fetch_locator_from_clone(sink, locator.as_ref()).await
    }

    /// Fetches a single file from the cloned repository by parsed URL.
    pub async fn fetch_url_from_clone<W>(&self, sink: &mut W, url: &Url) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let locator = classify_url(url, &self.config)?;
        self.fetch_locator_from_clone(sink, locator.as_ref()).await
    }

    /// Fetches a single file from the cloned repository.
    ///
    /// The locator's repository URL must match the cloned URL exactly
    /// (string comparison, not structural equality).
    pub async fn fetch_locator_from_clone<W>(
        &self,
        sink: &mut W,
        locator: &dyn Locate,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let cloned = self.cloned.as_ref().ok_or(VcsError::NoClone)?;

        let requested = locator.repo_url();
        if requested.as_str() != cloned.url.as_str() {
            return Err(VcsError::CloneMismatch {
                requested: requested.to_string(),
                cloned: cloned.url.to_string(),
            });
        }

        let mut file = cloned.tree.open(locator.sub_path()).await?;
        futures::io::copy(&mut file, sink).await?;

        Ok(())
    }

    /// Resets the state of the cloner, releasing the tree view. An
    /// auto-created backing directory is removed; explicit directories are
    /// left untouched.
    pub fn close(&mut self) -> Result<()> {
        if self.cloned.take().is_none() {
            return Ok(());
        }
        self.config.factory.release();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scratch::{Scratch, ScratchFactory};
    use vcs_locator::SpdxLocator;

    fn cloner_with_tree(url: &str, files: &[(&str, &str)]) -> Cloner {
        let scratch = ScratchFactory::Memory.scratch().unwrap();
        for (path, content) in files {
            let target = scratch.root().join(path);
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::write(target, content).unwrap();
        }
        Cloner {
            config: Config::default(),
            sparse: Vec::new(),
            cloned: Some(Cloned {
                url: url.parse().unwrap(),
                tree: tree_over(scratch),
            }),
        }
    }

    fn tree_over(scratch: Scratch) -> CloneTree {
        CloneTree::new(scratch)
    }

    #[async_std::test]
    async fn fetch_from_clone_requires_a_clone() {
        let cloner = Cloner::new();
        let mut sink: Vec<u8> = Vec::new();
        let err = cloner
            .fetch_from_clone(&mut sink, "git+https://github.com/user/repo@main#README.md")
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::NoClone));
    }

    #[async_std::test]
    async fn fetch_from_clone_serves_the_cloned_tree() {
        let cloner = cloner_with_tree(
            "https://github.com/user/repo",
            &[("README.md", "hello from the clone\n")],
        );

        let mut sink: Vec<u8> = Vec::new();
        cloner
            .fetch_from_clone(&mut sink, "git+https://github.com/user/repo@main#README.md")
            .await
            .unwrap();
        assert_eq!(sink, b"hello from the clone\n");
    }

    #[async_std::test]
    async fn fetch_from_clone_rejects_other_repositories() {
        let cloner = cloner_with_tree(
            "https://github.com/user/repo",
            &[("README.md", "hello from the clone\n")],
        );

        let mut sink: Vec<u8> = Vec::new();
        let err = cloner
            .fetch_from_clone(&mut sink, "git+https://github.com/user/other@main#README.md")
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::CloneMismatch { .. }));
        assert!(sink.is_empty());
    }

    #[async_std::test]
    async fn close_releases_the_tree() {
        let mut cloner = cloner_with_tree(
            "https://github.com/user/repo",
            &[("README.md", "hello from the clone\n")],
        );
        let root = cloner.tree().unwrap().root().to_path_buf();
        assert!(root.exists());

        cloner.close().unwrap();
        assert!(cloner.tree().is_none());
        assert!(!root.exists());

        let locator: SpdxLocator = "git+https://github.com/user/repo@main#README.md"
            .parse()
            .unwrap();
        let mut sink: Vec<u8> = Vec::new();
        let err = cloner
            .fetch_locator_from_clone(&mut sink, &locator)
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::NoClone));
    }
}
