//! Inputs handed to a [`crate::traits::Renderer`].

use crate::models::{SignRecord, SignReward, UserStats};

/// One row of the friends board produced by `steam check`.
#[derive(Debug, Clone)]
pub struct FriendStatus {
    pub steamid: String,
    pub name: String,
    pub nickname: Option<String>,
    pub status: String,
    pub personastate: i64,
    pub avatar: Vec<u8>,
}

/// The `steam info` profile card.
#[derive(Debug, Clone)]
pub struct PlayerCard {
    pub background: Vec<u8>,
    pub avatar: Vec<u8>,
    pub player_name: String,
    pub friend_code: String,
    pub description: String,
    pub recent_2_week_play_time: String,
    pub games: Vec<String>,
}

/// Daily sign-in / profile card.
#[derive(Debug, Clone)]
pub struct SignCard {
    pub user_name: String,
    pub stats: UserStats,
    pub record: SignRecord,
    /// `None` when the card is shown without a fresh reward (already signed, profile query).
    pub reward: Option<SignReward>,
    pub skin_name: String,
    pub skin_image: Option<Vec<u8>>,
    /// Character line picked for the time of day and favourability.
    pub quote: String,
}
