use super::CacheSlot;
use crate::error::Result;
use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Streams a remote resource into the cache slot on a background task.
/// Failures never reach the caller; the readiness monitor's timeout is the only signal.
#[derive(Debug, Clone)]
pub struct ProgressiveDownloader {
    client: Client,
}

impl ProgressiveDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Start the transfer and return immediately. Must be called from inside a tokio runtime.
    ///
    /// The slot file is created (or truncated) here, before the task exists. The
    /// task only ever writes through that handle, so once the slot is cleared a
    /// late transfer lands in its own unlinked file and never in a newer one.
    pub fn start(&self, url: String, slot: &CacheSlot) -> Result<DownloadHandle> {
        let client = self.client.clone();
        let path = slot.path().to_path_buf();
        let file = tokio::fs::File::from_std(std::fs::File::create(&path)?);

        debug!("Starting background download into {}", path.display());
        let task = tokio::spawn(async move {
            match fetch_to_file(&client, &url, file).await {
                Ok(written) => {
                    info!("Download finished: {} bytes in {}", written, path.display());
                    Some(written)
                }
                Err(e) => {
                    // nobody is listening - the monitor will time out on its own
                    warn!("Download into {} failed: {}", path.display(), e);
                    None
                }
            }
        });

        Ok(DownloadHandle {
            path: slot.path().to_path_buf(),
            task,
        })
    }
}

/// The running transfer. Dropping it detaches the task; `abort` cancels it.
#[derive(Debug)]
pub struct DownloadHandle {
    path: PathBuf,
    task: JoinHandle<Option<u64>>,
}

impl DownloadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the transfer; `None` if it failed or was aborted
    pub async fn join(self) -> Option<u64> {
        self.task.await.ok().flatten()
    }
}

async fn fetch_to_file(client: &Client, url: &str, mut file: tokio::fs::File) -> Result<u64> {
    let response = client.get(url).send().await?.error_for_status()?;

    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        // push each chunk to disk so size polling sees steady growth
        file.flush().await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering any request with `status` and `body`
    async fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/track.mp3", addr)
    }

    #[tokio::test]
    async fn test_download_lands_in_slot() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));
        let url = serve_once("200 OK", vec![7u8; 25_000]).await;

        let handle = ProgressiveDownloader::new(Client::new()).start(url, &slot).unwrap();
        assert_eq!(handle.path(), slot.path());
        assert_eq!(handle.join().await, Some(25_000));
        assert_eq!(slot.size().unwrap(), Some(25_000));
    }

    #[tokio::test]
    async fn test_download_overwrites_previous_contents() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));
        std::fs::write(slot.path(), vec![1u8; 50_000]).unwrap();
        let url = serve_once("200 OK", b"ID3 fresh".to_vec()).await;

        let handle = ProgressiveDownloader::new(Client::new())
            .start(url, &slot)
            .unwrap();
        handle.join().await;

        assert_eq!(std::fs::read(slot.path()).unwrap(), b"ID3 fresh");
    }

    #[tokio::test]
    async fn test_http_error_is_swallowed() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));
        let url = serve_once("404 Not Found", b"nope".to_vec()).await;

        let handle = ProgressiveDownloader::new(Client::new())
            .start(url, &slot)
            .unwrap();
        assert_eq!(handle.join().await, None);
        // the slot was opened up front and nothing was written to it
        assert_eq!(slot.size().unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_swallowed() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));

        // bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let handle = ProgressiveDownloader::new(Client::new())
            .start(format!("http://{}/gone.mp3", addr), &slot)
            .unwrap();
        assert_eq!(handle.join().await, None);
    }

    #[tokio::test]
    async fn test_abort_cancels_transfer() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));

        // accepts but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });

        let handle = ProgressiveDownloader::new(Client::new())
            .start(format!("http://{}/slow.mp3", addr), &slot)
            .unwrap();
        assert!(!handle.is_finished());
        handle.abort();
        assert_eq!(handle.join().await, None);
    }

    #[tokio::test]
    async fn test_start_creates_slot_before_any_response() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));
        std::fs::write(slot.path(), vec![1u8; 50_000]).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = ProgressiveDownloader::new(Client::new())
            .start(format!("http://{}/late.mp3", addr), &slot)
            .unwrap();
        assert_eq!(slot.size().unwrap(), Some(0));
        handle.abort();
    }

    #[tokio::test]
    async fn test_late_headers_cannot_overwrite_newer_download() {
        let dir = tempdir().unwrap();
        let slot = CacheSlot::new(dir.path().join("stage"));
        let downloader = ProgressiveDownloader::new(Client::new());

        // track A: headers only show up well after track B has taken the slot
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            let body = vec![b'A'; 5_000];
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        let stale = downloader
            .start(format!("http://{}/a.mp3", addr), &slot)
            .unwrap();

        // next cycle: clear the slot and start B, which answers at once
        slot.clear().unwrap();
        let url = serve_once("200 OK", vec![b'B'; 25_000]).await;
        let fresh = downloader.start(url, &slot).unwrap();

        assert_eq!(fresh.join().await, Some(25_000));
        assert_eq!(stale.join().await, Some(5_000));

        let staged = std::fs::read(slot.path()).unwrap();
        assert_eq!(staged.len(), 25_000);
        assert!(staged.iter().all(|&b| b == b'B'));
    }
}
