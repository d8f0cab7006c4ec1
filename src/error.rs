// Error types for scplay
// Everything the library can fail with lives here; the binary wraps it in anyhow

use std::io;
use std::path::PathBuf;

/// Result type alias for scplay operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read config: {0}")]
    ConfigRead(#[from] toml::de::Error),

    #[error("Could not write config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Startup configuration problem - the only fatal error class
    #[error("Missing credentials: {path} must contain your API client id")]
    MissingCredentials { path: PathBuf },

    /// Readiness monitor ran out of attempts before the cache slot held enough data
    #[error("Download not ready after {attempts} checks (needed more than {min_bytes} bytes)")]
    NotReady { attempts: u32, min_bytes: u64 },

    #[error("There is no track {index} in the list ({len} results)")]
    TrackOutOfRange { index: usize, len: usize },

    #[error("Track '{title}' is marked downloadable but has no download URL")]
    MissingDownloadUrl { title: String },

    #[error("Failed to start player '{program}': {source}")]
    PlayerSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Player command is empty")]
    EmptyPlayerCommand,

    #[error("Failed to signal process group {pgid}: {source}")]
    Signal {
        pgid: i32,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors the interactive session reports and carries on from
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::MissingCredentials { .. })
    }
}
