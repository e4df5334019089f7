pub mod steam_broadcast;

pub use steam_broadcast::spawn_steam_broadcast_task;
