use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use madoka_core::config::{BotConfig, EchoConfig, SignConfig, SteamConfig};
use madoka_core::tasks::spawn_steam_broadcast_task;

mod console_host;
mod context;

use console_host::ConsoleHost;
use context::BotContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "madokabot")]
#[command(author, version, about = "MadokaBot - Steam status broadcasts and group sign-ins")]
struct Args {
    /// Steam Web API key.
    #[arg(long, env = "STEAM_API_KEY", default_value = "", hide_env_values = true)]
    steam_api_key: String,

    /// HTTP(S) proxy for Steam requests.
    #[arg(long, env = "PROXY")]
    proxy: Option<String>,

    /// Seconds between Steam polls.
    #[arg(long, env = "STEAM_REQUEST_INTERVAL", default_value_t = 300)]
    steam_request_interval: u64,

    /// `part` for text plus cards, `none` for text only.
    #[arg(long, env = "STEAM_BROADCAST_TYPE", default_value = "part")]
    steam_broadcast_type: String,

    #[arg(long, env = "STEAM_CACHE_TTL", default_value_t = 30)]
    steam_cache_ttl: u64,

    #[arg(long, env = "STEAM_CACHE_CAPACITY", default_value_t = 5000)]
    steam_cache_capacity: usize,

    /// JSON stores (binds, snapshots, group data).
    #[arg(long, env = "MADOKA_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Downloaded avatars.
    #[arg(long, env = "MADOKA_CACHE_DIR", default_value = "cache")]
    cache_dir: PathBuf,

    #[arg(long, env = "MADOKA_ASSETS_PATH", default_value = "assets")]
    assets_path: PathBuf,

    /// SQLite file for points and sign-ins.
    #[arg(long, env = "MADOKA_DATABASE", default_value = "data/madoka.db")]
    database_url: String,

    /// Comma separated sign-in keywords.
    #[arg(long, env = "SIGN_KEYWORDS", value_delimiter = ',', default_value = "sign,签到,打卡")]
    sign_keywords: Vec<String>,

    #[arg(long, env = "SIGN_DEFAULT_SKIN", default_value = "skin01")]
    default_skin: String,

    #[arg(long, env = "ECHO_REPLY", default_value = "I'm here")]
    echo_reply: String,

    #[arg(long, env = "ECHO_KEYWORDS", value_delimiter = ',', default_value = "ping")]
    echo_keywords: Vec<String>,

    /// Id the console host answers pokes as.
    #[arg(long, env = "MADOKA_SELF_ID", default_value = "10000")]
    self_id: String,

    /// Where the console host writes images it would have sent.
    #[arg(long, env = "MADOKA_OUTBOX", default_value = "outbox")]
    outbox_dir: PathBuf,
}

impl Args {
    fn bot_config(&self) -> BotConfig {
        BotConfig {
            data_dir: self.data_dir.clone(),
            cache_dir: self.cache_dir.clone(),
            assets_path: self.assets_path.clone(),
            database_url: self.database_url.clone(),
            steam: SteamConfig {
                api_key: self.steam_api_key.clone(),
                proxy: self.proxy.clone().filter(|p| !p.is_empty()),
                request_interval_secs: self.steam_request_interval,
                broadcast_type: self.steam_broadcast_type.clone(),
                cache_ttl_secs: self.steam_cache_ttl,
                cache_capacity: self.steam_cache_capacity,
            },
            sign: SignConfig {
                keywords: self.sign_keywords.clone(),
                default_skin: self.default_skin.clone(),
            },
            echo: EchoConfig {
                reply: self.echo_reply.clone(),
                keywords: self.echo_keywords.clone(),
            },
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("madoka=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "MadokaBot starting. data_dir={}, interval={}s, broadcast={}",
        args.data_dir.display(),
        args.steam_request_interval,
        args.steam_broadcast_type
    );

    let host = Arc::new(ConsoleHost::new(args.outbox_dir.clone()));
    let ctx = BotContext::new(args.bot_config(), host.clone()).await?;

    let broadcast_handle = spawn_steam_broadcast_task(
        ctx.broadcaster.clone(),
        ctx.config.steam.request_interval(),
    );

    tokio::select! {
        res = console_host::run(host, ctx.message_service.clone(), args.self_id.clone()) => {
            if let Err(e) = res {
                error!("Console host stopped: {:?}", e);
            }
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("Failed to listen for Ctrl-C: {:?}", e);
            }
            info!("Ctrl-C detected; shutting down...");
        }
    }

    broadcast_handle.abort();
    ctx.db.pool().close().await;
    info!("Main finished. Goodbye!");
    Ok(())
}
