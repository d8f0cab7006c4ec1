use super::{
    CacheSlot, DownloadHandle, PlaybackStrategy, PlaybackTarget, ProcessSupervisor,
    ProgressiveDownloader, ReadinessMonitor, ReadinessPolicy, StagedFormat,
};
use crate::catalog::Track;
use crate::config::{Config, Credentials};
use crate::error::{Error, Result};
use reqwest::Client;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playing the partially downloaded cache slot
    Staged {
        path: PathBuf,
        attempts: u32,
        format: StagedFormat,
    },
    Streaming { url: String },
}

/// Ties the engine together: stop, pick a strategy, stage if needed, spawn
pub struct Player {
    supervisor: ProcessSupervisor,
    slot: CacheSlot,
    downloader: ProgressiveDownloader,
    monitor: ReadinessMonitor,
    credentials: Credentials,
    download: Option<DownloadHandle>,
}

impl Player {
    pub fn new(
        supervisor: ProcessSupervisor,
        slot: CacheSlot,
        downloader: ProgressiveDownloader,
        policy: ReadinessPolicy,
        credentials: Credentials,
    ) -> Self {
        Self {
            supervisor,
            slot,
            downloader,
            monitor: ReadinessMonitor::new(policy),
            credentials,
            download: None,
        }
    }

    pub fn from_config(config: &Config, client: Client, credentials: Credentials) -> Result<Self> {
        Ok(Self::new(
            ProcessSupervisor::from_config(&config.player)?,
            CacheSlot::new(config.cache.path.clone()),
            ProgressiveDownloader::new(client),
            config.readiness.clone().into(),
            credentials,
        ))
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    pub fn cache_slot(&self) -> &CacheSlot {
        &self.slot
    }

    /// The most recent background transfer, if any
    pub fn download(&self) -> Option<&DownloadHandle> {
        self.download.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.supervisor.is_playing()
    }

    /// `true` if something was actually stopped
    pub fn stop(&mut self) -> Result<bool> {
        self.supervisor.stop()
    }

    /// Play `tracks[index]`. An out-of-range index changes nothing.
    pub async fn play(&mut self, tracks: &[Track], index: usize) -> Result<PlayOutcome> {
        let track = tracks.get(index).ok_or(Error::TrackOutOfRange {
            index,
            len: tracks.len(),
        })?;

        // at most one player group alive: always stop before any spawn
        self.stop()?;

        let strategy = PlaybackStrategy::select(track);
        info!("Playing '{}' via {:?}", track.title, strategy);

        match strategy {
            PlaybackStrategy::LocalStaged => self.play_staged(track).await,
            PlaybackStrategy::DirectStream => self.play_stream(track),
        }
    }

    async fn play_staged(&mut self, track: &Track) -> Result<PlayOutcome> {
        let locator = PlaybackStrategy::LocalStaged
            .locator(track)
            .ok_or_else(|| Error::MissingDownloadUrl {
                title: track.title.clone(),
            })?;
        let url = self.credentials.sign(locator)?;

        // start from an empty slot so the size we poll belongs to this track
        self.slot.clear()?;

        if let Some(previous) = self.download.take() {
            if !previous.is_finished() {
                debug!("Leaving previous download running in the background");
            }
        }
        self.download = Some(self.downloader.start(url, &self.slot)?);

        let attempts = match self.monitor.wait(&self.slot).await {
            Ok(attempts) => attempts,
            Err(e) => {
                warn!("Giving up on '{}': {}", track.title, e);
                return Err(e);
            }
        };

        let format = self.slot.sniff_format().unwrap_or(StagedFormat::Unknown);
        if !format.is_known() {
            warn!("Staged file does not look like audio, handing it to the player anyway");
        }

        let path = self.slot.path().to_path_buf();
        self.supervisor
            .spawn(PlaybackTarget::LocalFile(path.clone()))?;

        Ok(PlayOutcome::Staged {
            path,
            attempts,
            format,
        })
    }

    fn play_stream(&mut self, track: &Track) -> Result<PlayOutcome> {
        let url = self.credentials.sign(&track.stream_url)?;
        self.supervisor
            .spawn(PlaybackTarget::StreamUrl(url.clone()))?;
        Ok(PlayOutcome::Streaming { url })
    }
}
