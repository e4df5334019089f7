// File: madoka-common/src/models/mod.rs
pub mod steam;
pub mod bind;
pub mod user;
pub mod message;
pub mod render;

pub use steam::{PersonaState, PlayEvent, PlayerData, PlayerSnapshot, RecentGame};
pub use bind::{BindRecord, ParentMeta};
pub use user::{SignRecord, SignReward, UserSkin, UserStats};
pub use message::{GroupInfo, GroupMessage, IncomingEvent, MessageSegment, OutgoingMessage, PokeNotice};
pub use render::{FriendStatus, PlayerCard, SignCard};
