//! Error taxonomy for the forecast pipeline.
//!
//! None of these are fatal to the process. The scheduler decides what each one
//! means for the current cycle.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single bounded download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connect, TLS, timeout or mid-stream I/O failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP error status {0}")]
    HttpStatus(u16),

    /// The body did not fit. `written` bytes are left in the buffer, followed
    /// by a NUL terminator.
    #[error("response truncated after {written} bytes (buffer too small)")]
    Truncated { written: usize },
}

/// The cache lock could not be taken in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {0:?} waiting for the weather cache lock")]
pub struct LockTimeout(pub Duration);

/// Failure of one scheduled fetch cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("forecast is not valid JSON: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    #[error(transparent)]
    LockTimeout(#[from] LockTimeout),

    #[error("could not allocate a {bytes} byte response buffer")]
    Allocation { bytes: usize },
}

/// Failure of a geocoding lookup.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("geocoding response is not valid JSON: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    #[error("geocoding response is not a JSON array")]
    NotAnArray,

    #[error("no geocoding results for '{0}'")]
    Empty(String),

    /// The first result carried (0, 0), which doubles as the failure sentinel.
    #[error("geocoding returned zero coordinates")]
    UnsetCoordinates,

    #[error("could not allocate a {bytes} byte response buffer")]
    Allocation { bytes: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_error_converts_into_fetch_error() {
        let err: FetchError = DownloadError::HttpStatus(503).into();
        assert!(matches!(err, FetchError::Download(DownloadError::HttpStatus(503))));
        assert_eq!(err.to_string(), "HTTP error status 503");
    }

    #[test]
    fn truncation_message_reports_written_bytes() {
        let err = DownloadError::Truncated { written: 4095 };
        assert!(err.to_string().contains("4095 bytes"));
    }

    #[test]
    fn lock_timeout_converts_into_fetch_error() {
        let err: FetchError = LockTimeout(Duration::from_millis(5000)).into();
        assert!(matches!(err, FetchError::LockTimeout(_)));
        assert!(err.to_string().contains("weather cache lock"));
    }
}
