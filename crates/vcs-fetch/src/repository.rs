//! Repository engine: advertisement, strategy selection and retrieval.
//!
//! Every retrieval runs the same sequence: initialize an empty repository in
//! a scratch store with a remote named `origin`, list the advertised
//! references, select one, probe the server's protocol capabilities, then
//! route to the cheapest correct path:
//!
//! 1. native `git archive` over a pipe, when a local git binary is present
//!    and the transport supports it (`git` or `ssh`);
//! 2. otherwise an in-process protocol fetch of the selected hash followed
//!    by a checkout restricted to the requested path.
//!
//! libgit2 work runs on blocking tasks so the executor is never pinned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::{AsyncWrite, AsyncWriteExt};
use url::Url;

use crate::capabilities;
use crate::error::{Result, VcsError};
use crate::native;
use crate::options::Config;
use crate::refs::{pick_ref, RemoteRef};
use crate::scratch::Scratch;
use crate::tree::CloneTree;

/// A handle on one remote git repository.
///
/// Construction validates the transport but performs no I/O; resources are
/// only fetched per operation, into a scratch store handed out by the
/// configured factory.
pub(crate) struct Repository {
    repo_url: Url,
    config: Config,
}

const ORIGIN: &str = "origin";

impl Repository {
    pub(crate) fn new(repo_url: Url, config: Config) -> Result<Self> {
        let scheme = repo_url.scheme();
        // the only recognized vcs tool prefix is git+
        let transport = scheme.strip_prefix("git+").unwrap_or(scheme);
        // local repositories are deliberately out of scope
        if !matches!(transport, "http" | "https" | "ssh" | "git") {
            return Err(VcsError::UnsupportedScheme(scheme.to_owned()));
        }

        Ok(Self { repo_url, config })
    }

    /// Fetches a single file at a given ref and copies it to the sink.
    ///
    /// The sink is written only once the selected strategy starts streaming
    /// actual content; a failed resolution or fetch leaves it untouched.
    pub(crate) async fn fetch<W>(&self, sink: &mut W, sub_path: &str, reference: &str) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let scratch = self.config.factory.scratch()?;

        let started = Instant::now();
        let advertised = advertise(scratch.root().to_path_buf(), self.repo_url.clone()).await?;
        tracing::debug!(
            "advertisement: {} refs, elapsed: {:?}",
            advertised.len(),
            started.elapsed()
        );

        let selected = pick_ref(&advertised, reference, &self.config.policy)?;
        tracing::debug!("selected {} -> {}", selected.name, selected.hash);

        let caps = capabilities::probe(&self.config.client, &self.repo_url).await?;
        tracing::debug!("remote capabilities: {caps:?}");

        if !self.config.skip_autodetect && self.archive_supported() {
            if let Some(git) = native::installed_git() {
                tracing::debug!("git is installed, using the native archive path");
                match native::spawn_archive(&git, &self.repo_url, &selected.hash, sub_path) {
                    Ok(child) => return native::consume_archive(child, sink).await,
                    // never started: the in-process path can still serve
                    Err(e) => {
                        tracing::warn!("could not start git archive, falling back: {e}");
                    }
                }
            }
        }

        self.fetch_in_process(&scratch, &selected, sub_path, sink)
            .await
    }

    /// Clones at a given ref and exposes the checked-out tree as a
    /// read-only view. The scratch area moves into the returned tree and
    /// lives as long as it does.
    pub(crate) async fn clone_tree(&self, reference: &str, sparse: &[String]) -> Result<CloneTree> {
        let scratch = self.config.factory.scratch()?;
        let root = scratch.root().to_path_buf();

        let advertised = advertise(root.clone(), self.repo_url.clone()).await?;
        let selected = pick_ref(&advertised, reference, &self.config.policy)?;
        tracing::debug!("cloning {} at {}", self.repo_url, selected.hash);

        let hash = selected.hash.clone();
        let filters = sparse.to_vec();
        async_std::task::spawn_blocking(move || -> Result<()> {
            let repo = open_repo(&root)?;
            fetch_hash(&repo, &hash, 1)?;
            let commit = find_commit(&repo, &hash)?;

            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout.force();
            for filter in &filters {
                checkout.path(filter.as_str());
            }
            repo.checkout_tree(commit.as_object(), Some(&mut checkout))
                .map_err(|e| VcsError::git("could not check out the cloned tree", e))?;
            repo.set_head_detached(commit.id())
                .map_err(|e| VcsError::git("could not detach HEAD on the cloned tree", e))?;
            Ok(())
        })
        .await?;

        Ok(CloneTree::new(scratch))
    }

    /// `git archive --remote` only speaks the git and ssh transports.
    fn archive_supported(&self) -> bool {
        let scheme = self.repo_url.scheme();
        matches!(
            scheme.strip_prefix("git+").unwrap_or(scheme),
            "git" | "ssh"
        )
    }

    async fn fetch_in_process<W>(
        &self,
        scratch: &Scratch,
        selected: &RemoteRef,
        sub_path: &str,
        sink: &mut W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let root = scratch.root().to_path_buf();
        let hash = selected.hash.clone();
        let file = sub_path.trim_start_matches('/').to_owned();
        let materialize = !self.config.factory.is_memory();

        let started = Instant::now();
        let fetched = async_std::task::spawn_blocking(move || -> Result<Fetched> {
            let repo = open_repo(&root)?;
            fetch_hash(&repo, &hash, 0)?;
            let commit = find_commit(&repo, &hash)?;

            if materialize {
                checkout_sparse(&repo, &commit, &file)?;
                Ok(Fetched::Path(root.join(&file)))
            } else {
                // nothing caller-visible is materialized: stream the blob
                // straight out of the object database
                let tree = commit
                    .tree()
                    .map_err(|e| VcsError::git("could not read the fetched tree", e))?;
                let entry = tree.get_path(Path::new(&file)).map_err(|e| {
                    VcsError::git(format!("did not find `{file}` in the fetched tree"), e)
                })?;
                let blob = repo
                    .find_blob(entry.id())
                    .map_err(|e| VcsError::git(format!("`{file}` is not a file"), e))?;
                Ok(Fetched::Bytes(blob.content().to_vec()))
            }
        })
        .await?;
        tracing::debug!("fetch+checkout: elapsed: {:?}", started.elapsed());

        match fetched {
            Fetched::Bytes(bytes) => sink.write_all(&bytes).await?,
            Fetched::Path(path) => {
                let mut fd = async_std::fs::File::open(&path).await.map_err(|e| {
                    std::io::Error::new(
                        e.kind(),
                        format!("did not find `{}` on checkout: {e}", path.display()),
                    )
                })?;
                futures::io::copy(&mut fd, sink).await?;
            }
        }
        tracing::debug!("copy: elapsed: {:?}", started.elapsed());

        Ok(())
    }
}

enum Fetched {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// Initializes an empty repository in the scratch store, attaches the
/// remote, and lists its advertised references (one read-only protocol
/// round-trip). Peeled `^{}` entries are folded into their tag's record.
async fn advertise(root: PathBuf, repo_url: Url) -> Result<Vec<RemoteRef>> {
    async_std::task::spawn_blocking(move || {
        let repo = git2::Repository::init(&root)
            .map_err(|e| VcsError::git("could not initialize repository", e))?;
        let mut remote = repo
            .remote(ORIGIN, repo_url.as_str())
            .map_err(|e| VcsError::git("could not configure the origin remote", e))?;

        remote
            .connect(git2::Direction::Fetch)
            .map_err(|e| VcsError::remote_protocol("could not connect to the remote", e))?;

        let mut peeled: HashMap<String, String> = HashMap::new();
        let mut listed: Vec<(String, String)> = Vec::new();
        for head in remote
            .list()
            .map_err(|e| VcsError::remote_protocol("could not list remote references", e))?
        {
            let name = head.name().to_owned();
            let oid = head.oid().to_string();
            if let Some(base) = name.strip_suffix("^{}") {
                peeled.insert(base.to_owned(), oid);
                continue;
            }
            listed.push((name, oid));
        }
        let _ = remote.disconnect();

        Ok(listed
            .into_iter()
            .filter_map(|(name, oid)| {
                let hash = peeled.get(&name).cloned().unwrap_or(oid);
                RemoteRef::from_advertised(&name, hash)
            })
            .collect())
    })
    .await
}

fn open_repo(root: &Path) -> Result<git2::Repository> {
    git2::Repository::open(root).map_err(|e| VcsError::git("could not open repository", e))
}

/// Fetches exactly one commit: refspec `+<hash>:refs/heads/<hash>`, no
/// tags, force. A zero depth means a full history fetch.
fn fetch_hash(repo: &git2::Repository, hash: &str, depth: i32) -> Result<()> {
    let mut remote = repo
        .find_remote(ORIGIN)
        .map_err(|e| VcsError::git("could not find the origin remote", e))?;

    let refspec = format!("+{hash}:refs/heads/{hash}");
    let mut options = git2::FetchOptions::new();
    options.download_tags(git2::AutotagOption::None);
    if depth > 0 {
        options.depth(depth);
    }

    remote
        .fetch(&[refspec.as_str()], Some(&mut options), None)
        .map_err(|e| VcsError::remote_protocol(format!("could not fetch remote hash ref {hash}"), e))
}

fn find_commit<'r>(repo: &'r git2::Repository, hash: &str) -> Result<git2::Commit<'r>> {
    let oid =
        git2::Oid::from_str(hash).map_err(|e| VcsError::git(format!("invalid hash {hash}"), e))?;
    repo.find_object(oid, None)
        .and_then(|object| object.peel_to_commit())
        .map_err(|e| VcsError::git(format!("could not resolve {hash} to a commit"), e))
}

/// Sparse checkout of a single file. A top-level file gets no filter: the
/// underlying sparse engine cannot express a filter whose parent is the
/// repository root.
fn checkout_sparse(repo: &git2::Repository, commit: &git2::Commit<'_>, file: &str) -> Result<()> {
    let mut checkout = git2::build::CheckoutBuilder::new();
    checkout.force();

    let parent = Path::new(file).parent();
    if parent.is_some_and(|p| !p.as_os_str().is_empty() && p != Path::new("/")) {
        checkout.path(file);
    }

    repo.checkout_tree(commit.as_object(), Some(&mut checkout))
        .map_err(|e| VcsError::git("could not check out the fetched tree", e))?;
    repo.set_head_detached(commit.id())
        .map_err(|e| VcsError::git("could not detach HEAD", e))
}
