// Error types for paddock

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PaddockError {
    // Errors while fetching the session catalog
    #[snafu(display("Could not reach the session API at {url}"))]
    ApiTransportError { url: String, source: reqwest::Error },
    #[snafu(display("Session API returned HTTP {status}: {detail}"))]
    ApiStatusError { status: u16, detail: String },
    #[snafu(display("Could not parse the session API response"))]
    ApiParseError { source: serde_json::Error },
    #[snafu(display("Could not start the background runtime"))]
    RuntimeError { source: io::Error },
    #[snafu(display("Session catalog is unavailable: {reason}"))]
    CatalogLoadFailed { reason: String },
    #[snafu(display("Timed out after {seconds}s waiting for the session catalog"))]
    CatalogTimeout { seconds: u64 },

    // Errors for the local session index
    #[snafu(display("Error reading session index {path}"))]
    IndexReadError { path: String, source: csv::Error },
    #[snafu(display("Error writing session index {path}"))]
    IndexWriteError { path: String, source: csv::Error },
    #[snafu(display("Error scanning cache directory {path}"))]
    CacheScanError { path: String, source: io::Error },
    #[snafu(display("No ff1pkl files found in cache directory {path}"))]
    NoCachedSessions { path: String },

    // Cache configuration errors
    #[snafu(display("Invalid cache directory: {path}"))]
    InvalidCacheDirectory { path: String },
    #[snafu(display("Cache configuration failed: {detail}"))]
    CacheConfigurationFailed { detail: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Selection errors
    #[snafu(display("Selection not applied"))]
    SelectionError { source: crate::cascade::CommitError },

    // UI errors
    #[snafu(display("Could not start the user interface: {reason}"))]
    UiError { reason: String },
}

impl PaddockError {
    /// Detail string suitable for a status banner: the display message followed
    /// by the underlying cause when there is one.
    pub fn detail(&self) -> String {
        match std::error::Error::source(self) {
            Some(cause) => format!("{self}: {cause}"),
            None => self.to_string(),
        }
    }
}
