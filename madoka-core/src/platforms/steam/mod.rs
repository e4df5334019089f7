// File: src/platforms/steam/mod.rs

pub mod ids;
pub mod client;
pub mod profile;
pub mod avatar;

pub use ids::{batch_cache_key, friend_code, resolve_id, STEAM_ID_OFFSET};
pub use client::{SteamClient, STEAM_BATCH_SIZE};
pub use profile::{fetch_profile_page, ProfileDefaults};
pub use avatar::AvatarFetcher;
