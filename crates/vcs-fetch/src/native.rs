//! Native `git archive` retrieval path.
//!
//! When a local git binary is available and the remote speaks a transport
//! `git archive --remote` understands, streaming a tgz archive of the
//! requested path is much faster than a protocol fetch plus checkout:
//!
//! ```text
//! git archive --format=tgz --remote=<repo_url> <hash>:<sub_path>
//! ```
//!
//! The subprocess's stdout is piped through a gzip decoder into a tar
//! reader, and entry contents are concatenated into the caller's sink. The
//! child is always waited on; when the stream fails early or the operation
//! is dropped, the child is killed, stderr is captured (capped) and joined
//! into the returned error.

use std::path::{Path, PathBuf};

use async_compression::futures::bufread::GzipDecoder;
use async_process::{Child, ChildStdout, Command, Stdio};
use futures::io::BufReader;
use futures::{AsyncReadExt, AsyncWrite, StreamExt};
use url::Url;

use crate::error::{Result, VcsError};

const MAX_STDERR_CAPTURE: u64 = 2048;

/// Locates the git command on PATH.
pub(crate) fn installed_git() -> Option<PathBuf> {
    which::which("git").ok()
}

/// Starts the archive subprocess. A spawn failure means the subprocess was
/// never started, so the caller may still fall back to the in-process path.
pub(crate) fn spawn_archive(
    git: &Path,
    repo_url: &Url,
    hash: &str,
    sub_path: &str,
) -> std::io::Result<Child> {
    let target = format!("{hash}:{}", sub_path.trim_start_matches('/'));
    tracing::debug!("running git archive --format=tgz --remote={repo_url} {target}");

    Command::new(git)
        .arg("archive")
        .arg("--format=tgz")
        .arg(format!("--remote={repo_url}"))
        .arg(&target)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
}

pub(crate) async fn consume_archive<W>(child: Child, sink: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut guard = ChildGuard::new(child);

    let Some(stdout) = guard.child.stdout.take() else {
        return Err(VcsError::subprocess("missing stdout pipe", ""));
    };

    // closing the pipe on drop is what unblocks a child still writing, so
    // the tar consumer owns stdout
    let streamed = stream_entries(stdout, sink).await;
    finalize(guard, streamed).await
}

/// Decodes the tgz stream and concatenates entry contents into the sink.
async fn stream_entries<W>(stdout: ChildStdout, sink: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let gzip = GzipDecoder::new(BufReader::new(stdout));
    let archive = async_tar::Archive::new(gzip);

    let mut entries = archive.entries()?;
    while let Some(entry) = entries.next().await {
        let mut entry = entry?;
        futures::io::copy(&mut entry, sink).await?;
    }

    Ok(())
}

/// Always waits on the child, drains stderr with a cap, and composes the
/// final error out of the stream result, the exit status and the captured
/// stderr.
async fn finalize(mut guard: ChildGuard, streamed: std::io::Result<()>) -> Result<()> {
    let mut captured = Vec::new();
    if let Some(stderr) = guard.child.stderr.take() {
        let mut limited = stderr.take(MAX_STDERR_CAPTURE);
        let _ = limited.read_to_end(&mut captured).await;
        // drain whatever remains so the child never blocks on a full pipe
        let mut rest = limited.into_inner();
        let _ = futures::io::copy(&mut rest, &mut futures::io::sink()).await;
    }
    let stderr = String::from_utf8_lossy(&captured).trim().to_owned();

    let status = guard.wait().await;

    match (streamed, status) {
        (Ok(()), Ok(status)) if status.success() => Ok(()),
        (Ok(()), Ok(status)) => Err(VcsError::subprocess(
            format!("git archive exited with {status}"),
            stderr,
        )),
        (Ok(()), Err(wait_err)) => Err(VcsError::subprocess(
            format!("failed to wait on git archive: {wait_err}"),
            stderr,
        )),
        (Err(stream_err), _) if stream_err.kind() == std::io::ErrorKind::Interrupted => {
            Err(VcsError::Cancelled)
        }
        (Err(stream_err), Ok(status)) if !status.success() => Err(VcsError::subprocess(
            format!("{stream_err}; git archive exited with {status}"),
            stderr,
        )),
        (Err(stream_err), _) => Err(VcsError::subprocess(stream_err.to_string(), stderr)),
    }
}

/// Kills the child unless it has been waited on, so that dropping a pending
/// operation cannot leak a running subprocess.
struct ChildGuard {
    child: Child,
    waited: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            waited: false,
        }
    }

    async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        let status = self.child.status().await;
        self.waited = true;
        status
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.waited {
            let _ = self.child.kill();
        }
    }
}
