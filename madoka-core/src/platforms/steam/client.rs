use std::sync::Arc;
use std::time::Duration;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use madoka_common::models::PlayerSnapshot;
use crate::cache::TtlCache;
use crate::http::HttpClient;
use crate::platforms::steam::ids::batch_cache_key;
use crate::Error;

pub const PLAYER_SUMMARIES_URL: &str = "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v2/";

/// Upstream limit on ids per `GetPlayerSummaries` call.
pub const STEAM_BATCH_SIZE: usize = 25;

pub const BATCH_PAUSE: Duration = Duration::from_millis(100);

/// Batched, cached access to the Steam Web API.
pub struct SteamClient {
    http: Arc<dyn HttpClient>,
    api_key: String,
    cache: Arc<TtlCache<Vec<PlayerSnapshot>>>,
}

impl SteamClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        cache: Arc<TtlCache<Vec<PlayerSnapshot>>>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            cache,
        }
    }

    pub fn http(&self) -> &Arc<dyn HttpClient> {
        &self.http
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Looks up every id in chunks of [`STEAM_BATCH_SIZE`].
    ///
    /// A chunk is retried once; if the retry fails too it contributes nothing and the
    /// remaining chunks still run. Chunks are separated by a short pause.
    pub async fn fetch_batch(&self, ids: &[String]) -> Vec<PlayerSnapshot> {
        let mut players = Vec::new();
        if ids.is_empty() {
            return players;
        }

        let chunks: Vec<&[String]> = ids.chunks(STEAM_BATCH_SIZE).collect();
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.into_iter().enumerate() {
            match self.fetch_chunk(chunk).await {
                Ok(mut found) => players.append(&mut found),
                Err(e) => {
                    log_fetch_failure(&e, "giving up on chunk");
                }
            }
            if i < last {
                sleep(BATCH_PAUSE).await;
            }
        }
        players
    }

    /// [`fetch_batch`](Self::fetch_batch) behind the shared TTL cache. Requests for the
    /// same set of ids in any order hit the same cache line.
    pub async fn fetch_batch_cached(&self, ids: &[String], ttl: Duration) -> Vec<PlayerSnapshot> {
        let key = batch_cache_key(&self.api_key, ids);
        if let Some(hit) = self.cache.get(&key, ttl) {
            debug!("Steam summaries cache hit ({} ids)", ids.len());
            return hit;
        }

        let mut sorted = ids.to_vec();
        sorted.sort();
        let players = self.fetch_batch(&sorted).await;
        self.cache.set(key, players.clone());
        players
    }

    async fn fetch_chunk(&self, chunk: &[String]) -> Result<Vec<PlayerSnapshot>, Error> {
        match self.fetch_chunk_once(chunk).await {
            Ok(players) => Ok(players),
            Err(e) => {
                log_fetch_failure(&e, "retrying once");
                self.fetch_chunk_once(chunk).await
            }
        }
    }

    async fn fetch_chunk_once(&self, chunk: &[String]) -> Result<Vec<PlayerSnapshot>, Error> {
        let query = vec![
            ("key".to_string(), self.api_key.clone()),
            ("steamids".to_string(), chunk.join(",")),
        ];
        let raw = self.http.get_json(PLAYER_SUMMARIES_URL, &query).await?;
        Ok(parse_player_summaries(&raw))
    }
}

fn log_fetch_failure(e: &Error, stage: &str) {
    if e.is_transient() {
        warn!("Steam API request failed ({stage}): {e}");
    } else {
        error!("Steam API request error ({stage}): {e}");
    }
}

/// Extracts `response.players[*]` leniently: absent or mistyped fields become empty,
/// entries without a `steamid` are dropped.
pub fn parse_player_summaries(raw: &Value) -> Vec<PlayerSnapshot> {
    let Some(players) = raw
        .get("response")
        .and_then(|r| r.get("players"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    players.iter().filter_map(snapshot_from_value).collect()
}

fn snapshot_from_value(p: &Value) -> Option<PlayerSnapshot> {
    let steamid = string_field(p, "steamid").filter(|s| !s.is_empty())?;
    Some(PlayerSnapshot {
        steamid,
        personaname: string_field(p, "personaname").unwrap_or_default(),
        personastate: int_field(p, "personastate").unwrap_or(0),
        gameextrainfo: string_field(p, "gameextrainfo"),
        avatar: string_field(p, "avatar"),
        avatarfull: string_field(p, "avatarfull"),
        lastlogoff: int_field(p, "lastlogoff"),
        gameid: string_field(p, "gameid"),
        communityvisibilitystate: int_field(p, "communityvisibilitystate"),
        game_start_time: None,
    })
}

fn string_field(p: &Value, key: &str) -> Option<String> {
    match p.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn int_field(p: &Value, key: &str) -> Option<i64> {
    match p.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_known_fields_and_defaults_the_rest() {
        let raw = json!({"response": {"players": [
            {"steamid": "1", "personaname": "A", "personastate": 1, "gameextrainfo": "Dota 2", "gameid": "570"},
            {"steamid": "2"},
            {"personaname": "no id"}
        ]}});
        let players = parse_player_summaries(&raw);
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].current_game(), Some("Dota 2"));
        assert_eq!(players[0].gameid.as_deref(), Some("570"));
        assert_eq!(players[1].personaname, "");
        assert_eq!(players[1].personastate, 0);
        assert_eq!(players[1].gameextrainfo, None);
    }

    #[test]
    fn malformed_body_yields_nothing() {
        assert!(parse_player_summaries(&json!({"error": "bad key"})).is_empty());
        assert!(parse_player_summaries(&json!({"response": {"players": "nope"}})).is_empty());
    }
}
