use std::collections::HashMap;
use madoka_common::models::{PlayEvent, PlayerSnapshot};

/// Classifies what each player in `new` started, stopped or switched since `old`.
///
/// Events come out in `new` order. Players that only exist in `old` are ignored.
pub fn diff(old: &[PlayerSnapshot], new: &[PlayerSnapshot]) -> Vec<PlayEvent> {
    let old_by_id: HashMap<&str, &PlayerSnapshot> =
        old.iter().map(|p| (p.steamid.as_str(), p)).collect();

    let mut events = Vec::new();
    for player in new {
        let previous = old_by_id.get(player.steamid.as_str()).copied();
        let old_game = previous.and_then(PlayerSnapshot::current_game);

        match (previous, old_game, player.current_game()) {
            (_, None, Some(_)) => events.push(PlayEvent::Start { player: player.clone() }),
            (Some(old_player), Some(_), None) => events.push(PlayEvent::Stop {
                player: player.clone(),
                old_player: old_player.clone(),
            }),
            (Some(old_player), Some(before), Some(now)) if before != now => {
                events.push(PlayEvent::Change {
                    player: player.clone(),
                    old_player: old_player.clone(),
                })
            }
            _ => {}
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str, game: Option<&str>) -> PlayerSnapshot {
        PlayerSnapshot {
            steamid: id.into(),
            personaname: id.into(),
            personastate: 1,
            gameextrainfo: game.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn empty_game_counts_as_not_playing() {
        let events = diff(&[p("a", Some(""))], &[p("a", Some("Portal"))]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "start");
        assert!(diff(&[p("a", Some("Portal"))], &[p("a", Some(""))])[0].kind() == "stop");
    }

    #[test]
    fn new_player_without_a_game_is_silent() {
        assert!(diff(&[], &[p("a", None)]).is_empty());
    }
}
