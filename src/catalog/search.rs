use super::{DurationRange, Track};
use crate::config::Credentials;
use crate::error::{Error, Result};
use reqwest::{Client, Url};
use tracing::{debug, info};

/// Stateless catalog lookup: one GET, one ranked list
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl SearchClient {
    pub fn new(client: Client, base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credentials,
        }
    }

    pub fn search_url(&self, query: &str, range: DurationRange) -> Result<Url> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| Error::invalid_url(&self.base_url, e))?;
        url.query_pairs_mut()
            .append_pair("client_id", self.credentials.client_id())
            .append_pair("q", query)
            .append_pair("duration[from]", &range.min_ms.to_string())
            .append_pair("duration[to]", &range.max_ms.to_string())
            .append_pair("filter", "streamable,public");
        Ok(url)
    }

    /// Search the catalog, oldest upload first
    pub async fn search(&self, query: &str, range: DurationRange) -> Result<Vec<Track>> {
        let url = self.search_url(query, range)?;
        info!("Searching catalog for '{}'", query);

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let tracks = parse_results(&body)?;
        debug!("Catalog returned {} tracks", tracks.len());
        Ok(tracks)
    }
}

pub fn parse_results(body: &str) -> Result<Vec<Track>> {
    let mut tracks: Vec<Track> = serde_json::from_str(body)?;
    tracks.sort_by_key(|track| track.created_at);
    Ok(tracks)
}
