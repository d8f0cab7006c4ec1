// Progressive download + playback engine
// Stage remote audio into one local file, start the external player as soon
// as enough bytes landed, and keep at most one player process group alive

pub mod cache_slot;
pub mod downloader;
pub mod orchestrator;
pub mod readiness;
pub mod supervisor;

pub use cache_slot::{CacheSlot, StagedFormat};
pub use downloader::{DownloadHandle, ProgressiveDownloader};
pub use orchestrator::{PlayOutcome, Player};
pub use readiness::{ReadinessMonitor, ReadinessPolicy, SizeProbe};
pub use supervisor::{PlaybackHandle, PlayerCommand, ProcessSupervisor};

use crate::catalog::Track;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStrategy {
    /// Download into the cache slot, play the partial file
    LocalStaged,
    /// Hand the stream URL straight to the player
    DirectStream,
}

impl PlaybackStrategy {
    /// `downloadable` is the only thing that decides
    pub fn select(track: &Track) -> Self {
        if track.downloadable {
            PlaybackStrategy::LocalStaged
        } else {
            PlaybackStrategy::DirectStream
        }
    }

    /// The one locator this strategy reads from the track
    pub fn locator<'a>(&self, track: &'a Track) -> Option<&'a str> {
        match self {
            PlaybackStrategy::LocalStaged => track.download_url.as_deref(),
            PlaybackStrategy::DirectStream => Some(track.stream_url.as_str()),
        }
    }
}

/// What the external player gets pointed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackTarget {
    LocalFile(PathBuf),
    StreamUrl(String),
}

impl fmt::Display for PlaybackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackTarget::LocalFile(path) => write!(f, "{}", path.display()),
            PlaybackTarget::StreamUrl(url) => write!(f, "{}", url),
        }
    }
}
