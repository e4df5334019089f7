//! madoka-server/src/context.rs
//!
//! Owns every long-lived component: HTTP client manager, Steam cache, stores,
//! database and services. Built once by `main` and shared by reference.

use std::sync::Arc;
use tracing::info;
use madoka_common::traits::{ChatHost, Renderer, RewardRepository};
use madoka_core::assets::{AssetManager, ResType, SubFolder};
use madoka_core::cache::TtlCache;
use madoka_core::config::BotConfig;
use madoka_core::platforms::steam::{AvatarFetcher, ProfileDefaults, SteamClient};
use madoka_core::render::SvgRenderer;
use madoka_core::repositories::{BindStore, DisableStore, ParentStore, SqliteRewardRepository, SteamInfoStore};
use madoka_core::services::{
    EchoService, MessageService, PokeService, SettingsService, SignService, SteamBroadcaster,
    SteamCommandService,
};
use madoka_core::{Database, DefaultHttpClient, Error, HttpClient, HttpClientManager};

pub struct BotContext {
    pub config: BotConfig,
    pub db: Database,
    pub broadcaster: Arc<SteamBroadcaster>,
    pub message_service: Arc<MessageService>,
}

impl BotContext {
    pub async fn new(config: BotConfig, host: Arc<dyn ChatHost>) -> Result<Self, Error> {
        if config.data_dir.exists() && !config.data_dir.is_dir() {
            return Err(Error::Config(format!(
                "data dir {} is not a directory",
                config.data_dir.display()
            )));
        }
        std::fs::create_dir_all(&config.data_dir)?;

        let db = Database::new(&config.database_url).await?;
        db.migrate().await?;

        let http_manager = Arc::new(HttpClientManager::new(config.steam.proxy.clone()));
        let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new(http_manager));
        let cache = Arc::new(TtlCache::new(config.steam.cache_capacity));
        let steam = Arc::new(SteamClient::new(http.clone(), config.steam.api_key.clone(), cache));
        if !steam.has_api_key() {
            tracing::warn!("STEAM_API_KEY is not set; Steam lookups will fail");
        }

        let data = &config.data_dir;
        let binds = Arc::new(BindStore::load(data.join("bind_data.json")).await?);
        let steam_info = Arc::new(SteamInfoStore::load(data.join("steam_info.json")).await?);
        let parents = Arc::new(ParentStore::load(data.join("parent_data.json"), data.join("parents")).await?);
        let disabled = Arc::new(DisableStore::load(data.join("disable_parent_data.json")).await?);

        let assets = AssetManager::new(&config.assets_path);
        let unknown_avatar = assets.read_or_empty(ResType::Image, SubFolder::Steam, "unknown_avatar.png");
        let profile_defaults = ProfileDefaults {
            avatar: unknown_avatar.clone(),
            background: assets.read_or_empty(ResType::Image, SubFolder::Steam, "default_background.png"),
        };
        let avatars = Arc::new(AvatarFetcher::new(
            http.clone(),
            Some(config.cache_dir.clone()),
            unknown_avatar,
        ));
        let renderer: Arc<dyn Renderer> = Arc::new(SvgRenderer::new());

        let broadcaster = Arc::new(SteamBroadcaster::new(
            steam.clone(),
            binds.clone(),
            steam_info,
            disabled.clone(),
            avatars.clone(),
            renderer.clone(),
            host.clone(),
            config.steam.broadcast_type.clone(),
            config.steam.cache_ttl(),
        ));

        let reward_repo: Arc<dyn RewardRepository> = Arc::new(SqliteRewardRepository::new(db.pool().clone()));
        let sign = Arc::new(SignService::new(
            reward_repo.clone(),
            renderer.clone(),
            assets.clone(),
            config.sign.clone(),
        ));
        let steam_commands = SteamCommandService::new(
            steam,
            binds,
            parents,
            disabled,
            avatars,
            renderer,
            host.clone(),
            profile_defaults,
        );
        let message_service = Arc::new(MessageService::new(
            host,
            EchoService::new(config.echo.clone()),
            PokeService::new(assets.clone()),
            sign.clone(),
            SettingsService::new(reward_repo, sign, assets),
            steam_commands,
        ));

        info!("Bot context ready (data dir: {})", config.data_dir.display());
        Ok(Self {
            config,
            db,
            broadcaster,
            message_service,
        })
    }
}
