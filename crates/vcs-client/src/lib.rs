//! Raw-content downloads over HTTP.
//!
//! SCM providers usually serve file bytes from a plain HTTPS endpoint,
//! without any git protocol exchange. This crate issues that single GET and
//! streams the body to the caller's sink. It supports only the `http` and
//! `https` URL schemes (a `git+` vcs tool prefix is tolerated and stripped);
//! anything else must go through the git machinery.

use std::time::Duration;

use async_compat::CompatExt;
use futures::{AsyncWrite, TryStreamExt};
use url::Url;

mod error;

pub use error::{RawClientError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Indicates if the provided URL can be downloaded directly.
///
/// This works for http and https URL schemes, but not ssh or git.
pub fn supported(url: &Url) -> bool {
    matches!(effective_scheme(url), "http" | "https")
}

fn effective_scheme(url: &Url) -> &str {
    match url.scheme().split_once('+') {
        Some((_, transport)) => transport,
        None => url.scheme(),
    }
}

/// Options for a [`RawClient`].
#[derive(Debug, Clone, Default)]
pub struct RawOpts {
    timeout: Option<Duration>,
    basic_auth: Option<(String, String)>,
    headers: Vec<(String, String)>,
    client: Option<reqwest::Client>,
}

impl RawOpts {
    pub fn new() -> Self {
        Default::default()
    }

    /// Request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send basic authentication with every request.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    /// Append a custom header to every request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Use a preconfigured [`reqwest::Client`] instead of the default one.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> RawClient {
        RawClient {
            client: self.client.unwrap_or_default(),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            basic_auth: self.basic_auth,
            headers: self.headers,
        }
    }
}

/// Client downloading raw content from provider HTTP endpoints.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct RawClient {
    client: reqwest::Client,
    timeout: Duration,
    basic_auth: Option<(String, String)>,
    headers: Vec<(String, String)>,
}

impl Default for RawClient {
    fn default() -> Self {
        RawOpts::new().build()
    }
}

impl RawClient {
    /// Downloads the resource at `url` and copies the fetched content to the
    /// sink. Succeeds iff the server answers 200; any other status is
    /// reported as [`RawClientError::Status`].
    ///
    /// Returns the number of bytes copied.
    pub async fn download<W>(&self, url: &Url, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let target = self.downloadable(url)?;
        // reqwest futures expect a tokio reactor; bridge them into the
        // caller's executor
        self.request(target, sink).compat().await
    }

    fn downloadable(&self, url: &Url) -> Result<Url> {
        let scheme = url.scheme();
        let effective = effective_scheme(url);
        if !matches!(effective, "http" | "https") {
            return Err(RawClientError::UnsupportedScheme(scheme.to_owned()));
        }

        if scheme == effective {
            Ok(url.clone())
        } else {
            // strip the vcs tool prefix, e.g. git+https -> https
            Ok(url
                .as_str()
                .replacen(&format!("{scheme}://"), &format!("{effective}://"), 1)
                .parse()
                .expect("URL failed to parse"))
        }
    }

    async fn request<W>(&self, url: Url, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut request = self.client.get(url.clone()).timeout(self.timeout);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Some((username, password)) = &self.basic_auth {
            request = request.basic_auth(username, Some(password));
        }

        tracing::debug!("raw download: GET {url}");
        let response = request.send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(RawClientError::Status { url, status });
        }

        let mut body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
            .into_async_read();

        Ok(futures::io::copy(&mut body, sink).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_support() {
        let supported_scheme = |s: &str| supported(&format!("{s}://host/p").parse().unwrap());

        assert!(supported_scheme("http"));
        assert!(supported_scheme("https"));
        assert!(supported_scheme("git+https"));
        assert!(!supported_scheme("ssh"));
        assert!(!supported_scheme("git+ssh"));
        assert!(!supported_scheme("git"));
        assert!(!supported_scheme("file"));
    }

    #[test]
    fn tool_prefix_is_stripped_before_download() {
        let client = RawClient::default();
        let target = client
            .downloadable(&"git+https://github.com/a/b".parse().unwrap())
            .unwrap();
        assert_eq!(target.as_str(), "https://github.com/a/b");
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        let client = RawClient::default();
        let err = client.downloadable(&"ssh://git@github.com/a/b".parse().unwrap());
        assert!(matches!(err, Err(RawClientError::UnsupportedScheme(_))));
    }
}
