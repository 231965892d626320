//! Ephemeral backing stores for retrieval operations.
//!
//! Every operation gets a scratch area from a [`ScratchFactory`], which is
//! called exactly once per operation. The factory decides between the
//! memory-like variant (an owned temporary directory, removed when the
//! scratch is dropped) and a caller-supplied directory (pre-cleaned on every
//! operation, never removed by this library).

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

pub(crate) const SCRATCH_PREFIX: &str = "vcsclone";

/// Decides where an operation's object store and working tree live.
#[derive(Debug, Clone)]
pub(crate) enum ScratchFactory {
    /// Nothing caller-visible: a fresh owned temporary directory per
    /// operation, destroyed with the operation.
    Memory,
    /// A fixed directory. When auto-created, the `TempDir` guard is shared
    /// with the owning handle so the directory is removed when the handle
    /// goes away; explicit directories have no guard and are left behind.
    Filesystem {
        dir: PathBuf,
        guard: Option<Arc<TempDir>>,
    },
}

impl ScratchFactory {
    /// Creates the factory for an enabled backing directory. With no
    /// explicit directory, an owned one is created under the platform temp
    /// root.
    ///
    /// # Panics
    ///
    /// Panics when the temporary directory cannot be created, as documented
    /// on the backing-dir options.
    pub(crate) fn filesystem(dir: Option<PathBuf>) -> Self {
        match dir {
            Some(dir) => ScratchFactory::Filesystem { dir, guard: None },
            None => {
                let tmp = TempDir::with_prefix(SCRATCH_PREFIX).unwrap_or_else(|e| {
                    panic!("could not create a temporary folder to clone into: {e}")
                });
                ScratchFactory::Filesystem {
                    dir: tmp.path().to_path_buf(),
                    guard: Some(Arc::new(tmp)),
                }
            }
        }
    }

    pub(crate) fn is_memory(&self) -> bool {
        matches!(self, ScratchFactory::Memory)
    }

    /// Hands out the scratch area for one operation, pre-cleaning fixed
    /// directories so repeated operations against the same handle start
    /// clean.
    ///
    /// Two concurrent operations over the same fixed directory would race
    /// destructively; the contract is one handle per directory at a time.
    pub(crate) fn scratch(&self) -> io::Result<Scratch> {
        match self {
            ScratchFactory::Memory => Ok(Scratch::Owned(TempDir::with_prefix(SCRATCH_PREFIX)?)),
            ScratchFactory::Filesystem { dir, .. } => {
                match std::fs::remove_dir_all(dir) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e),
                }
                std::fs::create_dir_all(dir)?;
                Ok(Scratch::Borrowed(dir.clone()))
            }
        }
    }

    /// Drops the guard of an auto-created directory, removing it if this
    /// factory holds the last reference.
    pub(crate) fn release(&mut self) {
        if let ScratchFactory::Filesystem { guard, .. } = self {
            guard.take();
        }
    }
}

/// The scratch area of a single operation.
#[derive(Debug)]
pub(crate) enum Scratch {
    Owned(TempDir),
    Borrowed(PathBuf),
}

impl Scratch {
    pub(crate) fn root(&self) -> &Path {
        match self {
            Scratch::Owned(tmp) => tmp.path(),
            Scratch::Borrowed(dir) => dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_scratch_is_removed_on_drop() {
        let factory = ScratchFactory::Memory;
        let root = {
            let scratch = factory.scratch().unwrap();
            assert!(scratch.root().exists());
            scratch.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn fixed_directory_is_precleaned_and_kept() {
        let keep = tempfile::tempdir().unwrap();
        let dir = keep.path().join("backing");
        std::fs::create_dir_all(dir.join("stale")).unwrap();
        std::fs::write(dir.join("stale/junk"), b"junk").unwrap();

        let factory = ScratchFactory::filesystem(Some(dir.clone()));
        {
            let scratch = factory.scratch().unwrap();
            assert_eq!(scratch.root(), dir.as_path());
            assert!(!dir.join("stale").exists());
        }
        // dropping a borrowed scratch leaves the directory to the caller
        assert!(dir.exists());
    }

    #[test]
    fn auto_directory_is_owned() {
        let mut factory = ScratchFactory::filesystem(None);
        let ScratchFactory::Filesystem { dir, guard } = &factory else {
            panic!("expected a filesystem factory");
        };
        assert!(guard.is_some());
        let dir = dir.clone();
        assert!(dir.exists());

        factory.release();
        assert!(!dir.exists());
    }
}
