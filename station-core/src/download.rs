//! Bounded HTTP downloads.
//!
//! The body of a GET is streamed into a caller-owned buffer instead of being
//! collected into a growable one, so peak memory is fixed by the caller.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::endpoint::redact_api_key;
use crate::error::DownloadError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Zeroed buffer of `size` bytes, or `None` if the allocation fails.
pub fn scratch_buffer(size: usize) -> Option<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(size).ok()?;
    buffer.resize(size, 0);
    Some(buffer)
}

#[derive(Debug, Clone)]
pub struct Downloader {
    http: Client,
}

impl Downloader {
    /// `timeout` bounds the whole request, body included. With `https_only`
    /// plain-HTTP URLs are refused before any connection is made.
    pub fn new(timeout: Duration, https_only: bool) -> Result<Self, DownloadError> {
        let http = Client::builder()
            .use_rustls_tls()
            .https_only(https_only)
            .timeout(timeout)
            .build()?;

        Ok(Self { http })
    }

    /// GET `url` into `buffer`, returning the number of body bytes written.
    ///
    /// At most `buffer.len() - 1` bytes are written and a NUL byte is placed
    /// right after them. A body that does not fit yields
    /// [`DownloadError::Truncated`] with the partial bytes left in place.
    pub async fn download(&self, url: &str, buffer: &mut [u8]) -> Result<usize, DownloadError> {
        let Some(limit) = buffer.len().checked_sub(1) else {
            return Err(DownloadError::Truncated { written: 0 });
        };

        debug!(url = %redact_api_key(url), "starting download");

        // reqwest errors carry the request URL, which holds the API key.
        let mut response = self.http.get(url).send().await.map_err(|e| {
            let e = e.without_url();
            error!(error = %e, "connection error");
            DownloadError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "HTTP error status");
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > limit as u64 {
                warn!(
                    content_length = length,
                    buffer_size = limit,
                    "Content-Length exceeds buffer size, data may be truncated"
                );
            }
        }

        let mut written = 0;
        let outcome = loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let n = chunk.len().min(limit - written);
                    buffer[written..written + n].copy_from_slice(&chunk[..n]);
                    written += n;
                    if n < chunk.len() {
                        warn!(written, "buffer full, response truncated");
                        break Err(DownloadError::Truncated { written });
                    }
                }
                Ok(None) => break Ok(written),
                Err(e) => {
                    let e = e.without_url();
                    error!(error = %e, written, "I/O error during download");
                    break Err(DownloadError::Network(e));
                }
            }
        };

        buffer[written] = 0;

        if outcome.is_ok() {
            info!(
                bytes = written,
                buffer_used_pct = written as f64 * 100.0 / buffer.len() as f64,
                "download OK"
            );
        }

        outcome
    }
}
