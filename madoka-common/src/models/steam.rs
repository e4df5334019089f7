use serde::{Deserialize, Serialize};

/// Bucketed form of Steam's numeric `personastate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaState {
    Offline,
    /// 1 (online), 2 (busy), 4 (snooze)
    Online,
    /// 3
    Away,
    /// 5 (looking to trade), 6 (looking to play)
    LookingTo,
    Unknown,
}

impl From<i64> for PersonaState {
    fn from(value: i64) -> Self {
        match value {
            0 => PersonaState::Offline,
            1 | 2 | 4 => PersonaState::Online,
            3 => PersonaState::Away,
            5 | 6 => PersonaState::LookingTo,
            _ => PersonaState::Unknown,
        }
    }
}

/// One player entry as returned by `GetPlayerSummaries`, plus the locally tracked
/// `game_start_time`. Every upstream field is optional on the wire, so missing ones
/// fall back to their empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSnapshot {
    pub steamid: String,
    pub personaname: String,
    pub personastate: i64,
    pub gameextrainfo: Option<String>,
    pub avatar: Option<String>,
    pub avatarfull: Option<String>,
    pub lastlogoff: Option<i64>,
    pub gameid: Option<String>,
    pub communityvisibilitystate: Option<i64>,

    /// Unix time the current `gameextrainfo` was first observed. Maintained by the
    /// steam-info store, never sent by Steam.
    pub game_start_time: Option<i64>,
}

impl PlayerSnapshot {
    /// The game being played, treating an empty string the same as no game.
    pub fn current_game(&self) -> Option<&str> {
        self.gameextrainfo.as_deref().filter(|g| !g.is_empty())
    }

    pub fn persona_state(&self) -> PersonaState {
        PersonaState::from(self.personastate)
    }

    /// Full-size avatar when available, the small one otherwise.
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatarfull
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.avatar.as_deref().filter(|u| !u.is_empty()))
    }
}

/// Classified change in a tracked player's activity between two polls.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayEvent {
    Start {
        player: PlayerSnapshot,
    },
    Stop {
        player: PlayerSnapshot,
        old_player: PlayerSnapshot,
    },
    Change {
        player: PlayerSnapshot,
        old_player: PlayerSnapshot,
    },
}

impl PlayEvent {
    pub fn player(&self) -> &PlayerSnapshot {
        match self {
            PlayEvent::Start { player }
            | PlayEvent::Stop { player, .. }
            | PlayEvent::Change { player, .. } => player,
        }
    }

    pub fn old_player(&self) -> Option<&PlayerSnapshot> {
        match self {
            PlayEvent::Start { .. } => None,
            PlayEvent::Stop { old_player, .. } | PlayEvent::Change { old_player, .. } => Some(old_player),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PlayEvent::Start { .. } => "start",
            PlayEvent::Stop { .. } => "stop",
            PlayEvent::Change { .. } => "change",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentGame {
    pub game_name: String,
}

/// Data scraped from a public community profile page.
#[derive(Debug, Clone)]
pub struct PlayerData {
    pub description: String,
    pub background: Vec<u8>,
    pub avatar: Vec<u8>,
    pub player_name: String,
    pub recent_2_week_play_time: Option<String>,
    pub game_data: Vec<RecentGame>,
}
