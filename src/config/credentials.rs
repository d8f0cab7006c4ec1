// API credentials - a single client id read from a text file
// Every remote URL (search, download, stream) gets it appended as a query parameter

use crate::error::{Error, Result};
use reqwest::Url;
use std::fs;
use std::path::Path;

#[derive(Clone)]
pub struct Credentials {
    client_id: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    /// Read the client id file. Missing or blank files are configuration errors.
    pub fn load(path: &Path) -> Result<Self> {
        let missing = || Error::MissingCredentials {
            path: path.to_path_buf(),
        };

        let content = fs::read_to_string(path).map_err(|_| missing())?;
        let client_id = content.trim();
        if client_id.is_empty() {
            return Err(missing());
        }

        Ok(Self::new(client_id))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Append `client_id=<id>` to `url`, keeping whatever query it already has
    pub fn sign(&self, url: &str) -> Result<String> {
        let mut parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e))?;
        parsed
            .query_pairs_mut()
            .append_pair("client_id", &self.client_id);
        Ok(parsed.to_string())
    }
}

// Keep the id out of debug logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &"<redacted>")
            .finish()
    }
}
