// File: src/repositories/mod.rs

pub mod json;
pub mod sqlite;

pub use json::{BindStore, DisableStore, JsonStore, ParentStore, SteamInfoStore};
pub use sqlite::SqliteRewardRepository;
