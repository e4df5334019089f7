// madoka-core/src/tasks/steam_broadcast.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;
use crate::services::SteamBroadcaster;

/// Spawns the Steam poll/broadcast loop. The first tick runs one `interval` after start.
pub fn spawn_steam_broadcast_task(broadcaster: Arc<SteamBroadcaster>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Steam broadcast task started, every {:?}", period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            broadcaster.run_tick().await;
        }
    })
}
