// Remote catalog - what a search hands back to the player
// Tracks are read-only once decoded; the playback engine only looks at the locators

pub mod search;

pub use search::SearchClient;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timestamp layout used by the catalog API, e.g. `2014/03/09 21:15:02 +0000`
pub const CATALOG_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S %z";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    #[serde(with = "catalog_date")]
    pub created_at: DateTime<FixedOffset>,
    /// milliseconds
    pub duration: u64,
    pub stream_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub permalink_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    pub user: TrackUser,
    #[serde(default)]
    pub downloadable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackUser {
    pub username: String,
}

impl Track {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration)
    }

    pub fn author(&self) -> &str {
        &self.user.username
    }

    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// Duration filter applied to searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DurationRange {
    pub fn from_minutes(min: u64, max: u64) -> Self {
        Self {
            min_ms: min * 60_000,
            max_ms: max * 60_000,
        }
    }

    pub fn contains(&self, duration_ms: u64) -> bool {
        duration_ms >= self.min_ms && duration_ms <= self.max_ms
    }
}

impl Default for DurationRange {
    fn default() -> Self {
        Self::from_minutes(50, 500)
    }
}

mod catalog_date {
    use super::CATALOG_DATE_FORMAT;
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(CATALOG_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&raw, CATALOG_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
