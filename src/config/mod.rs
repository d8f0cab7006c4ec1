// Configuration management for scplay
// Handles loading/saving settings, with sensible defaults when config is missing

pub mod credentials;

pub use credentials::Credentials;

use crate::error::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub credentials_file: PathBuf,
    pub cache: CacheConfig,
    pub readiness: ReadinessConfig,
    pub player: PlayerConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// The single staging file, overwritten on every download-then-play cycle
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub min_bytes: u64,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// argv for local staged files; the file path is appended
    pub file_command: Vec<String>,
    /// argv for direct streams; the signed URL is appended
    pub stream_command: Vec<String>,
    /// Pause between SIGTERM and SIGKILL. 0 kills right away.
    pub stop_grace_ms: u64,
    /// Send player stdout/stderr to /dev/null
    pub quiet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub min_duration_minutes: u64,
    pub max_duration_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_file: app_config_dir().join("client_id.txt"),
            cache: CacheConfig::default(),
            readiness: ReadinessConfig::default(),
            player: PlayerConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("scplay-stage"),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            min_bytes: 20_000,
            poll_interval_ms: 300,
            max_attempts: 60, // ~18s worst case
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let (file_command, stream_command) = if cfg!(target_os = "macos") {
            (
                vec!["afplay", "-v", "0.7"],
                vec!["/Applications/VLC.app/Contents/MacOS/VLC"],
            )
        } else {
            (
                vec!["mpv", "--no-video", "--volume=70"],
                vec!["mpv", "--no-video"],
            )
        };

        Self {
            file_command: file_command.into_iter().map(String::from).collect(),
            stream_command: stream_command.into_iter().map(String::from).collect(),
            stop_grace_ms: 0,
            quiet: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.soundcloud.com/tracks.json".to_string(),
            min_duration_minutes: 50,
            max_duration_minutes: 500,
        }
    }
}

impl ReadinessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl PlayerConfig {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> PathBuf {
        app_config_dir().join("config.toml")
    }
}

fn app_config_dir() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scplay")
}
