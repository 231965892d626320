use futures::{AsyncWrite, AsyncWriteExt};
use url::Url;
use vcs_locator::{GitLocator, Locate, SpdxLocator};

use crate::error::{Result, VcsError};
use crate::options::{Config, FetcherOpts};
use crate::repository::Repository;

/// Retrieves single files from vcs repositories.
///
/// The `Fetcher` is intended for read-only capture of remote resources. If
/// you need to mutate the retrieved content, consider another tool.
///
/// # Concurrency
///
/// The `Fetcher` is stateless and may be called concurrently; it is `Clone`
/// and clones share the underlying HTTP connection pool.
///
/// All fetches are carried out independently. To fetch multiple resources
/// out of a single repository, consider a [`Cloner`](crate::Cloner) for
/// improved performance.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    config: Config,
}

impl Fetcher {
    /// Builds a `Fetcher` with default settings. To configure it, use
    /// [`FetcherOpts`].
    pub fn new() -> Self {
        FetcherOpts::new().build()
    }

    pub(crate) fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Fetches a single file from a vcs location string and copies its
    /// content to the sink.
    ///
    /// The location must be a valid URL: either a SPDX locator or a
    /// recognized provider browse URL (the SPDX grammar wins when both
    /// apply).
    pub async fn fetch<W>(&self, sink: &mut W, location: impl AsRef<str>) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let locator = classify_str(location.as_ref(), &self.config)?;
        self.fetch_locator(sink, locator.as_ref()).await
    }

    /// Fetches a single file from a vcs location given as a parsed URL.
    pub async fn fetch_url<W>(&self, sink: &mut W, url: &Url) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let locator = classify_url(url, &self.config)?;
        self.fetch_locator(sink, locator.as_ref()).await
    }

    /// Fetches the single file addressed by a [`Locate`] implementation and
    /// copies its content to the sink.
    ///
    /// This crate provides two implementations, [`SpdxLocator`] and
    /// [`GitLocator`]; callers may pass their own.
    ///
    /// To retrieve a locator representing a folder, use a
    /// [`Cloner`](crate::Cloner) with a sparse filter instead.
    pub async fn fetch_locator<W>(&self, sink: &mut W, locator: &dyn Locate) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if self.config.require_version && locator.version().is_empty() {
            return Err(VcsError::RequireVersion(locator.to_string()));
        }

        let repo_url = locator.repo_url();

        // short-circuit that avoids git entirely thanks to a direct
        // raw-content URL from the SCM. This works on github.com and on any
        // gitlab, gitea or bitbucket instance.
        if !self.config.skip_raw_url && vcs_client::supported(&repo_url) {
            if let Ok(raw) = vcs_locator::raw_url(locator) {
                // buffered so a failed attempt leaves the sink untouched
                // before the git fallback runs
                let mut buffered: Vec<u8> = Vec::new();
                match self.config.client.download(&raw, &mut buffered).await {
                    Ok(_) => {
                        sink.write_all(&buffered).await?;
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::debug!("could not fetch raw content from {raw}: {e}");
                    }
                }
            }
        }

        // general-purpose git retrieval
        let repo = Repository::new(repo_url, self.config.clone())?;
        repo.fetch(sink, locator.sub_path(), locator.version()).await
    }
}

/// Classifies a location string: the SPDX grammar is unambiguous, so it is
/// tried first; provider autodetection is the fallback.
pub(crate) fn classify_str(
    location: &str,
    config: &Config,
) -> Result<Box<dyn Locate + Send + Sync>> {
    match SpdxLocator::parse(location, &config.spdx) {
        Ok(locator) => Ok(Box::new(locator)),
        Err(_) => match GitLocator::parse(location, &config.git_url) {
            Ok(locator) => Ok(Box::new(locator)),
            Err(e) => Err(VcsError::Locator(e)),
        },
    }
}

/// URL flavor of [`classify_str`].
pub(crate) fn classify_url(url: &Url, config: &Config) -> Result<Box<dyn Locate + Send + Sync>> {
    match SpdxLocator::from_url(url, &config.spdx) {
        Ok(locator) => Ok(Box::new(locator)),
        Err(_) => match GitLocator::from_url(url, &config.git_url) {
            Ok(locator) => Ok(Box::new(locator)),
            Err(e) => Err(VcsError::Locator(e)),
        },
    }
}
