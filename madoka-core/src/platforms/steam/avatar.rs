use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{error, warn};
use madoka_common::models::PlayerSnapshot;
use crate::http::HttpClient;

/// Downloaded avatars are reused from disk for a day.
pub const AVATAR_MAX_AGE: Duration = Duration::from_secs(86400);

/// Fetches player avatars with an optional on-disk cache and a bundled fallback.
pub struct AvatarFetcher {
    http: Arc<dyn HttpClient>,
    cache_dir: Option<PathBuf>,
    fallback: Vec<u8>,
}

impl AvatarFetcher {
    pub fn new(http: Arc<dyn HttpClient>, cache_dir: Option<PathBuf>, fallback: Vec<u8>) -> Self {
        Self { http, cache_dir, fallback }
    }

    pub fn fallback(&self) -> &[u8] {
        &self.fallback
    }

    /// Avatar bytes for `player`; the fallback image on any failure.
    pub async fn fetch(&self, player: &PlayerSnapshot) -> Vec<u8> {
        let Some(url) = player.avatar_url() else {
            warn!("Player {} has no avatar URL", player.steamid);
            return self.fallback.clone();
        };

        let Some(dir) = &self.cache_dir else {
            return self.download(url).await.unwrap_or_else(|| self.fallback.clone());
        };

        let path = dir.join(format!("avatar_{}.png", player.steamid));
        if let Some(bytes) = read_if_fresh(&path).await {
            return bytes;
        }

        match self.download(url).await {
            Some(bytes) => {
                if let Err(e) = tokio::fs::create_dir_all(dir).await {
                    error!("Failed to create avatar cache dir: {}", e);
                } else if let Err(e) = tokio::fs::write(&path, &bytes).await {
                    error!("Failed to save avatar {}: {}", path.display(), e);
                }
                bytes
            }
            None => self.fallback.clone(),
        }
    }

    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        match self.http.get_bytes(url).await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                warn!("Empty avatar body from {}", url);
                None
            }
            Err(e) => {
                warn!("Avatar download failed: {}, error: {}", url, e);
                None
            }
        }
    }
}

async fn read_if_fresh(path: &PathBuf) -> Option<Vec<u8>> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    let modified = meta.modified().ok()?;
    let age = SystemTime::now().duration_since(modified).unwrap_or_default();
    if age >= AVATAR_MAX_AGE {
        return None;
    }
    match tokio::fs::read(path).await {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        _ => {
            let _ = tokio::fs::remove_file(path).await;
            None
        }
    }
}
