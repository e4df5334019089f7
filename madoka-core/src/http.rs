//! HTTP client layer for the Steam integration.
//!
//! [`HttpClientManager`] owns the single pooled `reqwest::Client` for the process. It is
//! built lazily on first use, under a lock, so concurrent callers never race to create
//! two clients. [`HttpClient`] is the seam the Steam fetcher talks to, which lets tests
//! count and script upstream calls without a network.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use crate::Error;

pub const USER_AGENT: &str = "MadokaBot/SteamInfo";

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_POOL_CONNECTIONS: usize = 10;
pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);

/// Lazily builds and then hands out clones of one shared client.
pub struct HttpClientManager {
    proxy: Option<String>,
    client: Mutex<Option<reqwest::Client>>,
}

impl HttpClientManager {
    pub fn new(proxy: Option<String>) -> Self {
        Self {
            proxy,
            client: Mutex::new(None),
        }
    }

    pub async fn get_client(&self) -> Result<reqwest::Client, Error> {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = build_client(self.proxy.as_deref())?;
        debug!("Steam HTTP client initialized (proxy={:?})", self.proxy);
        *guard = Some(client.clone());
        Ok(client)
    }

    pub async fn is_initialized(&self) -> bool {
        self.client.lock().await.is_some()
    }
}

fn build_client(proxy: Option<&str>) -> Result<reqwest::Client, Error> {
    // reqwest cannot bound the write phase or the pool wait on their own, so the
    // whole request gets a ceiling of connect + write + read.
    let mut builder = reqwest::ClientBuilder::new()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT)
        .timeout(CONNECT_TIMEOUT + WRITE_TIMEOUT + READ_TIMEOUT)
        .redirect(Policy::limited(10))
        .pool_max_idle_per_host(MAX_POOL_CONNECTIONS)
        .pool_idle_timeout(KEEPALIVE_EXPIRY);

    if let Some(p) = proxy.filter(|p| !p.is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(p)?);
    }

    builder
        .build()
        .map_err(|e| Error::Platform(format!("Failed to build reqwest client: {e}")))
}

/// The calls the Steam integration needs.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET with query parameters; the body must be JSON and the status a success.
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, Error>;

    /// GET with extra headers (cookies go in a `Cookie` header); body as text.
    async fn get_text(&self, url: &str, headers: &[(String, String)]) -> Result<String, Error>;

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    manager: Arc<HttpClientManager>,
}

impl DefaultHttpClient {
    pub fn new(manager: Arc<HttpClientManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, Error> {
        let client = self.manager.get_client().await?;
        let value = client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(value)
    }

    async fn get_text(&self, url: &str, headers: &[(String, String)]) -> Result<String, Error> {
        let client = self.manager.get_client().await?;
        let mut request = client.get(url);
        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }
        let text = request
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, Error> {
        let client = self.manager.get_client().await?;
        let bytes = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_is_built_once_and_shared() {
        let manager = Arc::new(HttpClientManager::new(None));
        assert!(!manager.is_initialized().await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = manager.clone();
                tokio::spawn(async move { m.get_client().await.map(|_| ()) })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert!(manager.is_initialized().await);
    }
}
