//! Probe of the git smart-protocol capabilities advertised by a remote.
//!
//! Smart HTTP servers expose their feature list on the first advertised ref
//! line of `info/refs?service=git-upload-pack`, after a NUL byte:
//!
//! ```text
//! 001e# service=git-upload-pack\n
//! 0000
//! 0155<hash> HEAD\0multi_ack thin-pack side-band-64k shallow ...\n
//! ```
//!
//! Non-HTTP transports are not probed and report an empty capability list.

use url::Url;
use vcs_client::RawClient;

use crate::error::{Result, VcsError};

pub(crate) async fn probe(client: &RawClient, repo_url: &Url) -> Result<Vec<String>> {
    if !vcs_client::supported(repo_url) {
        return Ok(Vec::new());
    }

    let advert: Url = format!(
        "{}/info/refs?service=git-upload-pack",
        repo_url.as_str().trim_end_matches('/')
    )
    .parse()
    .map_err(|e: url::ParseError| VcsError::remote_protocol("capability probe", e))?;

    let mut body: Vec<u8> = Vec::new();
    client
        .download(&advert, &mut body)
        .await
        .map_err(|e| VcsError::remote_protocol("capability probe", e))?;

    Ok(parse_capabilities(&body))
}

/// Walks pkt-lines until the first ref line and splits its capability list.
fn parse_capabilities(data: &[u8]) -> Vec<String> {
    let mut offset = 0;

    while offset + 4 <= data.len() {
        let Some(len) = std::str::from_utf8(&data[offset..offset + 4])
            .ok()
            .and_then(|hex| usize::from_str_radix(hex, 16).ok())
        else {
            break;
        };

        if len == 0 {
            // flush-pkt
            offset += 4;
            continue;
        }
        if len < 4 || offset + len > data.len() {
            break;
        }

        let payload = &data[offset + 4..offset + len];
        offset += len;

        if payload.starts_with(b"# service=") {
            continue;
        }

        if let Some(nul) = payload.iter().position(|&b| b == 0) {
            return String::from_utf8_lossy(&payload[nul + 1..])
                .split_ascii_whitespace()
                .map(ToOwned::to_owned)
                .collect();
        }
        break;
    }

    Vec::new()
}
