use super::readiness::SizeProbe;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One fixed-path staging file. Cleared before each download-then-play cycle,
/// written only by the current downloader, read by the monitor and the player.
#[derive(Debug, Clone)]
pub struct CacheSlot {
    path: PathBuf,
}

impl CacheSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file. Returns whether there was one; a missing file is fine.
    pub fn clear(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Cleared cache slot {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Current size on disk, `None` while the downloader has not created it yet
    pub fn size(&self) -> io::Result<Option<u64>> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Peek at the first bytes to see what we are about to play
    pub fn sniff_format(&self) -> io::Result<StagedFormat> {
        let mut header = Vec::with_capacity(12);
        File::open(&self.path)?.take(12).read_to_end(&mut header)?;
        Ok(StagedFormat::from_header(&header))
    }
}

impl SizeProbe for CacheSlot {
    fn staged_len(&self) -> Option<u64> {
        match self.size() {
            Ok(len) => len,
            Err(e) => {
                debug!("Cache slot not readable yet: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedFormat {
    Mp3,
    Flac,
    Ogg,
    Mp4,
    Wav,
    Unknown,
}

impl StagedFormat {
    pub fn from_header(header: &[u8]) -> Self {
        match header {
            [b'I', b'D', b'3', ..] => StagedFormat::Mp3,
            // bare MPEG frame sync
            [0xFF, b, ..] if b & 0xE0 == 0xE0 => StagedFormat::Mp3,
            [b'f', b'L', b'a', b'C', ..] => StagedFormat::Flac,
            [b'O', b'g', b'g', b'S', ..] => StagedFormat::Ogg,
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => StagedFormat::Wav,
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => StagedFormat::Mp4,
            _ => StagedFormat::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StagedFormat::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));
        fs::write(slot.path(), b"old track").unwrap();

        assert!(slot.clear().unwrap());
        assert!(!slot.path().exists());
        assert!(!slot.clear().unwrap());
        assert!(!slot.clear().unwrap());
    }

    #[test]
    fn test_size_tracks_file() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));

        assert_eq!(slot.size().unwrap(), None);
        assert_eq!(slot.staged_len(), None);

        fs::write(slot.path(), vec![0u8; 1234]).unwrap();
        assert_eq!(slot.size().unwrap(), Some(1234));
        assert_eq!(slot.staged_len(), Some(1234));
    }

    #[test]
    fn test_sniff_staged_file() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));
        fs::write(slot.path(), b"ID3\x04\x00\x00\x00\x00\x00\x00rest").unwrap();

        assert_eq!(slot.sniff_format().unwrap(), StagedFormat::Mp3);
    }

    #[test]
    fn test_header_signatures() {
        assert_eq!(StagedFormat::from_header(b"fLaC\x00\x00"), StagedFormat::Flac);
        assert_eq!(StagedFormat::from_header(b"OggS\x00\x02"), StagedFormat::Ogg);
        assert_eq!(StagedFormat::from_header(b"RIFF\x24\x00\x00\x00WAVEfmt "), StagedFormat::Wav);
        assert_eq!(StagedFormat::from_header(b"\x00\x00\x00\x20ftypM4A "), StagedFormat::Mp4);
        assert_eq!(StagedFormat::from_header(&[0xFF, 0xFB, 0x90, 0x64]), StagedFormat::Mp3);
        assert_eq!(StagedFormat::from_header(b"<html>"), StagedFormat::Unknown);
        assert_eq!(StagedFormat::from_header(b""), StagedFormat::Unknown);
        assert!(!StagedFormat::Unknown.is_known());
    }
}
