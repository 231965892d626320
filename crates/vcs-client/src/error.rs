use miette::Diagnostic;
use thiserror::Error;
use url::Url;

/// Error type returned by raw-content download calls.
#[derive(Debug, Error, Diagnostic)]
pub enum RawClientError {
    /// Only http and https URLs can be downloaded directly.
    #[error("unsupported download scheme `{0}`, only http and https are supported")]
    #[diagnostic(code(vcs_client::unsupported_scheme))]
    UnsupportedScheme(String),

    /// The server answered with a non-200 status.
    #[error("could not fetch resource at `{url}` [{status}]")]
    #[diagnostic(code(vcs_client::status))]
    Status { url: Url, status: reqwest::StatusCode },

    /// The request itself failed (connectivity, TLS, timeout...).
    #[error("request failed")]
    #[diagnostic(code(vcs_client::request))]
    Request(#[from] reqwest::Error),

    /// Streaming the response body to the sink failed.
    #[error("failed to stream downloaded content")]
    #[diagnostic(code(vcs_client::io))]
    Io(#[from] std::io::Error),
}

/// The result type returned by calls to this library.
pub type Result<T> = std::result::Result<T, RawClientError>;
