pub mod steam;
pub mod sign_service;
pub mod settings_service;
pub mod poke_service;
pub mod echo_service;
pub mod message_service;

pub use steam::{SteamBroadcaster, SteamCommandService};
pub use sign_service::{SignOutcome, SignService};
pub use settings_service::SettingsService;
pub use poke_service::PokeService;
pub use echo_service::EchoService;
pub use message_service::MessageService;
