use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use madoka_common::models::{OutgoingMessage, PlayEvent, PlayerSnapshot};
use madoka_common::traits::{ChatHost, Renderer};
use crate::config::BroadcastMode;
use crate::platforms::steam::{AvatarFetcher, SteamClient};
use crate::repositories::{BindStore, DisableStore, SteamInfoStore};
use crate::services::steam::diff::diff;
use crate::utils::{current_epoch, format_play_duration};
use crate::Error;

/// Result of one scheduler tick, mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub players_fetched: usize,
    pub groups_notified: usize,
    pub groups_failed: usize,
}

/// Polls every bound account, diffs against the stored snapshots and announces
/// changes to each group.
pub struct SteamBroadcaster {
    steam: Arc<SteamClient>,
    binds: Arc<BindStore>,
    steam_info: Arc<SteamInfoStore>,
    disabled: Arc<DisableStore>,
    avatars: Arc<AvatarFetcher>,
    renderer: Arc<dyn Renderer>,
    host: Arc<dyn ChatHost>,
    broadcast_type: String,
    cache_ttl: Duration,
}

impl SteamBroadcaster {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        steam: Arc<SteamClient>,
        binds: Arc<BindStore>,
        steam_info: Arc<SteamInfoStore>,
        disabled: Arc<DisableStore>,
        avatars: Arc<AvatarFetcher>,
        renderer: Arc<dyn Renderer>,
        host: Arc<dyn ChatHost>,
        broadcast_type: impl Into<String>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            steam,
            binds,
            steam_info,
            disabled,
            avatars,
            renderer,
            host,
            broadcast_type: broadcast_type.into(),
            cache_ttl,
        }
    }

    pub async fn run_tick(&self) -> TickSummary {
        self.run_tick_at(current_epoch()).await
    }

    /// One full poll → diff → broadcast pass with `now` as the wall clock.
    pub async fn run_tick_at(&self, now: i64) -> TickSummary {
        let mut summary = TickSummary::default();

        let bind_map = self.binds.bind_map();
        if bind_map.is_empty() {
            debug!("No Steam binds, skipping tick");
            return summary;
        }

        let (old, fetched) = match self.update_steam_info(&bind_map, now).await {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to save refreshed Steam info: {}", e);
                return summary;
            }
        };
        summary.players_fetched = fetched;

        let mode = match self.broadcast_type.parse::<BroadcastMode>() {
            Ok(mode) => mode,
            Err(e) => {
                error!("{}; no broadcast this tick", e);
                return summary;
            }
        };

        let mut groups: Vec<&String> = bind_map.keys().collect();
        groups.sort();
        for group_id in groups {
            let Some(old_players) = old.get(group_id) else {
                continue;
            };
            let new_players = self.steam_info.get_players(&bind_map[group_id]);
            match self.broadcast_group(group_id, old_players, &new_players, mode, now).await {
                Ok(true) => summary.groups_notified += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.groups_failed += 1;
                    error!("Steam broadcast to group {} failed: {}", group_id, e);
                }
            }
        }

        info!(
            "Steam tick: {} players fetched, {} groups notified, {} failed",
            summary.players_fetched, summary.groups_notified, summary.groups_failed
        );
        summary
    }

    /// Fetches every bound id once, captures each group's previous snapshots and then
    /// overwrites the store. Returns the captured `old` side and the number of players
    /// Steam returned.
    pub async fn update_steam_info(
        &self,
        bind_map: &HashMap<String, Vec<String>>,
        now: i64,
    ) -> Result<(HashMap<String, Vec<PlayerSnapshot>>, usize), Error> {
        let ids: Vec<String> = bind_map
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let players = self.steam.fetch_batch_cached(&ids, self.cache_ttl).await;

        let old = bind_map
            .iter()
            .map(|(group, ids)| (group.clone(), self.steam_info.get_players(ids)))
            .collect();

        if players.is_empty() {
            warn!("Steam returned no players for {} ids; keeping previous snapshots", ids.len());
        } else {
            self.steam_info.update_by_players(&players, now).await?;
        }
        Ok((old, players.len()))
    }

    /// Sends the group's announcements. `Ok(false)` when nothing was sent.
    pub async fn broadcast_group(
        &self,
        group_id: &str,
        old_players: &[PlayerSnapshot],
        new_players: &[PlayerSnapshot],
        mode: BroadcastMode,
        now: i64,
    ) -> Result<bool, Error> {
        if self.disabled.is_disabled(group_id) {
            debug!("Broadcast disabled for group {}", group_id);
            return Ok(false);
        }

        let events = diff(old_players, new_players);
        let lines = build_lines(&events, now);
        if lines.is_empty() {
            return Ok(false);
        }

        let mut message = OutgoingMessage::text(lines.join("\n"));
        if mode == BroadcastMode::Detailed {
            if let Some(image) = self.render_events(group_id, &events).await? {
                message = message.with_image(image);
            }
        }

        self.host.send_group_message(group_id, message).await?;
        Ok(true)
    }

    /// One card per start/change event, stacked when there is more than one.
    async fn render_events(&self, group_id: &str, events: &[PlayEvent]) -> Result<Option<Vec<u8>>, Error> {
        let mut avatar_memo: HashMap<String, Vec<u8>> = HashMap::new();
        let mut images = Vec::new();

        for event in events {
            if matches!(event, PlayEvent::Stop { .. }) {
                continue;
            }
            let player = event.player();
            let avatar = match avatar_memo.get(&player.steamid) {
                Some(bytes) => bytes.clone(),
                None => {
                    let bytes = self.avatars.fetch(player).await;
                    avatar_memo.insert(player.steamid.clone(), bytes.clone());
                    bytes
                }
            };
            let nickname = self
                .binds
                .get_by_steam_id(group_id, &player.steamid)
                .and_then(|record| record.nickname);
            images.push(self.renderer.start_gaming(
                &avatar,
                &player.personaname,
                player.current_game().unwrap_or_default(),
                nickname.as_deref(),
            )?);
        }

        match images.len() {
            0 => Ok(None),
            1 => Ok(images.pop()),
            _ => self.renderer.concat_vertical(&images).map(Some),
        }
    }
}

/// Announcement lines, one per event. Durations run from the old snapshot's
/// `game_start_time` to `now`.
pub fn build_lines(events: &[PlayEvent], now: i64) -> Vec<String> {
    events
        .iter()
        .map(|event| match event {
            PlayEvent::Start { player } => format!(
                "{} started playing {}",
                player.personaname,
                player.current_game().unwrap_or_default()
            ),
            PlayEvent::Change { player, old_player } => format!(
                "{} played {} for {} and switched to {}",
                player.personaname,
                old_player.current_game().unwrap_or_default(),
                played_for(old_player, now),
                player.current_game().unwrap_or_default()
            ),
            PlayEvent::Stop { player, old_player } => format!(
                "{} played {} for {} and stopped",
                player.personaname,
                old_player.current_game().unwrap_or_default(),
                played_for(old_player, now)
            ),
        })
        .collect()
}

fn played_for(old_player: &PlayerSnapshot, now: i64) -> String {
    let started = old_player.game_start_time.unwrap_or(now);
    format_play_duration(now - started)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str, game: Option<&str>, start: Option<i64>) -> PlayerSnapshot {
        PlayerSnapshot {
            steamid: name.into(),
            personaname: name.into(),
            personastate: 1,
            gameextrainfo: game.map(String::from),
            game_start_time: start,
            ..Default::default()
        }
    }

    #[test]
    fn lines_per_event_kind() {
        let now = 10_000;
        let events = vec![
            PlayEvent::Start { player: p("A", Some("Dota 2"), None) },
            PlayEvent::Change {
                player: p("B", Some("Portal"), None),
                old_player: p("B", Some("Dota 2"), Some(now - 125 * 60)),
            },
            PlayEvent::Stop {
                player: p("C", None, None),
                old_player: p("C", Some("Portal"), Some(now - 45 * 60)),
            },
        ];
        assert_eq!(
            build_lines(&events, now),
            vec![
                "A started playing Dota 2".to_string(),
                "B played Dota 2 for 2 h 5 min and switched to Portal".to_string(),
                "C played Portal for 45 min and stopped".to_string(),
            ]
        );
    }
}
