use std::path::PathBuf;

use thiserror::Error;

/// Why a single fetch attempt failed. Every variant is recoverable: the
/// pipeline logs it and moves to the next relay, variant or source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("Proxy HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Invalid base64 data URL format")]
    InvalidDataUrl,
    #[error("Proxy returned empty response")]
    EmptyBody,
    #[error("All CORS proxies failed - none of the proxy services responded successfully")]
    RelaysExhausted,
    #[error("Failed to load local CSV {}: {message}", .path.display())]
    Local { path: PathBuf, message: String },
}

impl FetchError {
    pub(crate) fn transport(url: &str, err: &dyn std::fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Why relay text was rejected as a catalog export.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CsvRejection {
    #[error("received HTML instead of CSV")]
    Html,
    #[error("sheet appears to be empty")]
    Empty,
    #[error("first line is blank, no header row")]
    MissingHeader,
}

/// Every candidate source failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Google Sheet failed: {remote}. Local CSV also failed: {local}")]
    Exhausted { remote: String, local: String },
    #[error("Failed to load games.csv: {local}")]
    LocalOnly { local: String },
}

impl LoadError {
    /// Message shown to the user next to the fallback catalog.
    pub fn user_message(&self) -> String {
        format!(
            "Failed to load games data: {self}. Please check: 1) Sheet is shared publicly, \
             2) Sheet name is correct, 3) Your internet connection."
        )
    }
}
