use std::collections::BTreeMap;
use std::path::PathBuf;
use madoka_common::models::PlayerSnapshot;
use crate::repositories::json::JsonStore;
use crate::Error;

/// Last-known snapshot per steamid (`steam_info.json`). This is the "old" side of
/// every diff.
pub struct SteamInfoStore {
    store: JsonStore<BTreeMap<String, PlayerSnapshot>>,
}

impl SteamInfoStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self { store: JsonStore::load(path).await? })
    }

    pub fn get_player(&self, steam_id: &str) -> Option<PlayerSnapshot> {
        self.store.read(|m| m.get(steam_id).cloned())
    }

    /// Snapshots for `steam_ids`, in the given order, skipping ids never seen.
    pub fn get_players(&self, steam_ids: &[String]) -> Vec<PlayerSnapshot> {
        self.store.read(|m| {
            steam_ids
                .iter()
                .filter_map(|id| m.get(id).cloned())
                .collect()
        })
    }

    /// Overwrites the stored snapshots with `players` and saves.
    ///
    /// `game_start_time` is set to `now` when a game starts or changes, carried over
    /// while the same game continues and cleared once the player stops.
    pub async fn update_by_players(&self, players: &[PlayerSnapshot], now: i64) -> Result<(), Error> {
        self.store
            .mutate(|m| {
                for player in players {
                    let mut next = player.clone();
                    let old = m.get(&player.steamid);
                    next.game_start_time = match (old, next.current_game()) {
                        (_, None) => None,
                        (Some(old), Some(game)) if old.current_game() == Some(game) => {
                            old.game_start_time.or(Some(now))
                        }
                        (_, Some(_)) => Some(now),
                    };
                    m.insert(next.steamid.clone(), next);
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(id: &str, game: Option<&str>) -> PlayerSnapshot {
        PlayerSnapshot {
            steamid: id.into(),
            personaname: format!("p{id}"),
            personastate: 1,
            gameextrainfo: game.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn game_start_time_tracks_the_current_game() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SteamInfoStore::load(tmp.path().join("steam_info.json")).await.unwrap();

        store.update_by_players(&[playing("1", Some("Dota 2"))], 100).await.unwrap();
        assert_eq!(store.get_player("1").unwrap().game_start_time, Some(100));

        store.update_by_players(&[playing("1", Some("Dota 2"))], 200).await.unwrap();
        assert_eq!(store.get_player("1").unwrap().game_start_time, Some(100));

        store.update_by_players(&[playing("1", Some("Portal"))], 300).await.unwrap();
        assert_eq!(store.get_player("1").unwrap().game_start_time, Some(300));

        store.update_by_players(&[playing("1", None)], 400).await.unwrap();
        assert_eq!(store.get_player("1").unwrap().game_start_time, None);

        let reloaded = SteamInfoStore::load(tmp.path().join("steam_info.json")).await.unwrap();
        assert_eq!(reloaded.get_player("1").unwrap().personaname, "p1");
    }

    #[tokio::test]
    async fn unknown_ids_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SteamInfoStore::load(tmp.path().join("steam_info.json")).await.unwrap();
        store.update_by_players(&[playing("2", None)], 1).await.unwrap();

        let got = store.get_players(&["1".into(), "2".into()]);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].steamid, "2");
    }
}
