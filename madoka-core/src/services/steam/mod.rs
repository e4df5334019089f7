pub mod diff;
pub mod broadcast;
pub mod command_service;

pub use diff::diff;
pub use broadcast::{build_lines, SteamBroadcaster, TickSummary};
pub use command_service::{parse_target, SteamCommand, SteamCommandService, STEAM_USAGE};
