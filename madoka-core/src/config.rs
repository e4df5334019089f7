//! Runtime configuration. The server fills this from CLI flags / environment;
//! every section has defaults so tests can build one with `..Default::default()`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteamConfig {
    pub api_key: String,
    pub proxy: Option<String>,
    /// Seconds between broadcast ticks.
    pub request_interval_secs: u64,
    /// `part` (text + images) or `none` (text only). Kept as a string so a bad
    /// value is reported on every tick instead of failing startup.
    pub broadcast_type: String,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            proxy: None,
            request_interval_secs: 300,
            broadcast_type: "part".to_string(),
            cache_ttl_secs: 30,
            cache_capacity: 5000,
        }
    }
}

impl SteamConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_secs(self.request_interval_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastMode {
    /// Text plus one rendered card per start/change event.
    Detailed,
    TextOnly,
}

impl FromStr for BroadcastMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "part" | "detailed" => Ok(BroadcastMode::Detailed),
            "none" | "text" => Ok(BroadcastMode::TextOnly),
            other => Err(format!("Unknown broadcast type: {other}")),
        }
    }
}

impl fmt::Display for BroadcastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastMode::Detailed => write!(f, "part"),
            BroadcastMode::TextOnly => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignConfig {
    pub keywords: Vec<String>,
    pub default_skin: String,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["sign".into(), "签到".into(), "打卡".into()],
            default_skin: "skin01".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    pub reply: String,
    pub keywords: Vec<String>,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            reply: "I'm here".into(),
            keywords: vec!["ping".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// JSON stores live here.
    pub data_dir: PathBuf,
    /// Downloaded avatars.
    pub cache_dir: PathBuf,
    pub assets_path: PathBuf,
    pub database_url: String,
    pub steam: SteamConfig,
    pub sign: SignConfig,
    pub echo: EchoConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_dir: PathBuf::from("cache"),
            assets_path: PathBuf::from("assets"),
            database_url: "data/madoka.db".into(),
            steam: SteamConfig::default(),
            sign: SignConfig::default(),
            echo: EchoConfig::default(),
        }
    }
}
