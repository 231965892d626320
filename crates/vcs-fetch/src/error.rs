use miette::Diagnostic;
use thiserror::Error;
use vcs_client::RawClientError;
use vcs_locator::LocatorError;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by all fetch and clone calls.
#[derive(Debug, Error, Diagnostic)]
pub enum VcsError {
    /// The location could not be parsed as a SPDX locator or a provider URL.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Locator(#[from] LocatorError),

    /// The repository transport is not in the accepted set.
    #[error("transport `{0}` is not supported for retrieval, only http, https, ssh and git are")]
    #[diagnostic(code(vcs_fetch::unsupported_scheme))]
    UnsupportedScheme(String),

    /// A version was required by policy but the location does not carry one.
    #[error("an explicit version is required, but `{0}` does not specify one")]
    #[diagnostic(code(vcs_fetch::require_version))]
    RequireVersion(String),

    /// No advertised reference survived filtering.
    #[error("could not resolve any remote reference for ref spec `{0}`")]
    #[diagnostic(
        code(vcs_fetch::ref_not_found),
        help("the ref must name an advertised branch, tag or HEAD, or match tags as a semver constraint")
    )]
    RefNotFound(String),

    /// Multiple references survived filtering and the target is not a
    /// semver constraint, so there is no rule to order them.
    #[error("ref spec `{0}` resolved ambiguously to multiple refs")]
    #[diagnostic(code(vcs_fetch::ambiguous_ref))]
    AmbiguousRef(String),

    /// An advertisement, fetch or capability round-trip with the remote
    /// failed.
    #[error("remote protocol exchange failed: {context}")]
    #[diagnostic(code(vcs_fetch::remote_protocol))]
    RemoteProtocol {
        context: String,
        #[source]
        source: BoxedError,
    },

    /// A local git operation (init, checkout, object lookup) failed.
    #[error("git operation failed: {context}")]
    #[diagnostic(code(vcs_fetch::git))]
    Git {
        context: String,
        #[source]
        source: git2::Error,
    },

    /// The native `git archive` subprocess failed.
    #[error("git subprocess failed: {detail}{}", if .stderr.is_empty() { String::new() } else { format!(": {}", .stderr) })]
    #[diagnostic(
        code(vcs_fetch::subprocess),
        help("stderr from the subprocess, when any, is appended to the message")
    )]
    Subprocess { detail: String, stderr: String },

    /// The raw-content HTTPS short-circuit failed. Recovered internally by
    /// falling back to the git path; surfaces only from direct raw calls.
    #[error(transparent)]
    #[diagnostic(code(vcs_fetch::raw_fetch))]
    RawFetch(#[from] RawClientError),

    /// The operation was cancelled before completion.
    #[error("operation cancelled")]
    #[diagnostic(code(vcs_fetch::cancelled))]
    Cancelled,

    /// No repository has been cloned yet on this handle.
    #[error("cannot fetch from clone: no clone available yet")]
    #[diagnostic(code(vcs_fetch::no_clone))]
    NoClone,

    /// The locator does not address the repository held by this clone.
    #[error("cannot fetch `{requested}` from a clone of `{cloned}`")]
    #[diagnostic(code(vcs_fetch::clone_mismatch))]
    CloneMismatch { requested: String, cloned: String },

    #[error(transparent)]
    #[diagnostic(code(vcs_fetch::io))]
    Io(#[from] std::io::Error),
}

impl VcsError {
    pub(crate) fn remote_protocol<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        VcsError::RemoteProtocol {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn git(context: impl Into<String>, source: git2::Error) -> Self {
        VcsError::Git {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn subprocess(detail: impl Into<String>, stderr: impl Into<String>) -> Self {
        VcsError::Subprocess {
            detail: detail.into(),
            stderr: stderr.into(),
        }
    }
}

/// The result type returned by calls to this library.
pub type Result<T> = std::result::Result<T, VcsError>;
