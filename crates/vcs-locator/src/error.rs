use miette::Diagnostic;
use thiserror::Error;

use crate::giturl::Provider;

/// Error type returned by all locator parsing and URL synthesis calls.
#[derive(Debug, Error, Diagnostic)]
pub enum LocatorError {
    /// The input string is not a syntactically valid URL.
    #[error("expected a valid URL")]
    #[diagnostic(code(vcs_locator::invalid_url))]
    InvalidUrl(#[from] url::ParseError),

    /// The URL is well formed but violates the SPDX locator grammar.
    #[error("invalid SPDX locator: {0}")]
    #[diagnostic(
        code(vcs_locator::invalid_spdx),
        help("SPDX vcs locators look like `git+https://host/repo@ref#path`")
    )]
    InvalidSpdx(String),

    /// A version was required by policy but the location does not carry one.
    #[error("an explicit version is required, but `{0}` does not specify one")]
    #[diagnostic(code(vcs_locator::require_version))]
    RequireVersion(String),

    /// The URL does not match the provider's path grammar.
    #[error("invalid {provider} URL: {reason}")]
    #[diagnostic(code(vcs_locator::invalid_provider_url))]
    InvalidProviderUrl { provider: Provider, reason: String },

    /// Host-based autodetection did not match any known provider.
    #[error("no known provider matches host `{0}`")]
    #[diagnostic(
        code(vcs_locator::unknown_provider),
        help("detection matches host substrings: github, gitlab, azure, bitbucket, gitea")
    )]
    UnknownProvider(String),

    /// The provider was detected but this library has no parser for it.
    #[error("provider `{0}` is recognized but not supported")]
    #[diagnostic(code(vcs_locator::unsupported_provider))]
    UnsupportedProvider(Provider),

    /// No raw-content URL can be synthesized for this locator.
    #[error("no raw content URL for {provider}: {reason}")]
    #[diagnostic(code(vcs_locator::no_raw_url))]
    NoRawUrl { provider: Provider, reason: String },
}

/// The result type returned by calls to this library.
pub type Result<T> = std::result::Result<T, LocatorError>;
