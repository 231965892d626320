//! Read-only view over a cloned working tree.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, VcsError};
use crate::scratch::Scratch;

/// The checked-out tree of a cloned repository.
///
/// The view owns the scratch area backing the clone: dropping it releases
/// memory-like backings (owned temporary directories), while explicit
/// backing directories are left to their owner.
#[derive(Debug)]
pub struct CloneTree {
    scratch: Scratch,
}

impl CloneTree {
    pub(crate) fn new(scratch: Scratch) -> Self {
        Self { scratch }
    }

    /// Root of the checked-out tree on disk.
    pub fn root(&self) -> &Path {
        self.scratch.root()
    }

    /// Opens a file by repository-relative path.
    pub async fn open(&self, sub_path: &str) -> Result<async_std::fs::File> {
        let rel = clean(sub_path)?;
        Ok(async_std::fs::File::open(self.root().join(rel)).await?)
    }

    /// Reads a whole file by repository-relative path.
    pub async fn read(&self, sub_path: &str) -> Result<Vec<u8>> {
        let rel = clean(sub_path)?;
        Ok(async_std::fs::read(self.root().join(rel)).await?)
    }

    /// Indicates if a repository-relative path exists in the tree.
    pub async fn contains(&self, sub_path: &str) -> bool {
        match clean(sub_path) {
            Ok(rel) => self.root().join(rel).exists(),
            Err(_) => false,
        }
    }
}

/// The view never escapes the tree root: leading slashes are dropped and
/// parent traversals rejected.
fn clean(sub_path: &str) -> Result<PathBuf> {
    let rel = Path::new(sub_path.trim_start_matches('/'));
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(VcsError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid repository-relative path: {sub_path}"),
        )));
    }
    Ok(rel.to_path_buf())
}
