use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use madoka_common::models::{PersonaState, PlayerSnapshot};

/// Returns the current epoch seconds.
pub fn current_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Calendar day of `at` in Asia/Shanghai, where sign-in days roll over.
pub fn shanghai_today(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Shanghai).date_naive()
}

/// `"{h} h {m} min"`, or just `"{m} min"` under an hour. Negative spans count as zero.
pub fn format_play_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours} h {minutes} min")
    } else {
        format!("{minutes} min")
    }
}

/// "Last online ..." phrase for `elapsed` seconds since log-off.
pub fn last_online_text(elapsed: i64) -> String {
    match elapsed {
        e if e < 60 => "Last online just now".to_string(),
        e if e < 3600 => format!("Last online {} min ago", e / 60),
        e if e < 86400 => format!("Last online {} h ago", e / 3600),
        e if e < 2_592_000 => format!("Last online {} d ago", e / 86400),
        e if e < 31_536_000 => format!("Last online {} mo ago", e / 2_592_000),
        e => format!("Last online {} y ago", e / 31_536_000),
    }
}

/// Status line for the friends board.
pub fn persona_status_text(player: &PlayerSnapshot, now: i64) -> String {
    match player.persona_state() {
        PersonaState::Offline => match player.lastlogoff.filter(|t| *t > 0) {
            Some(logged_off) => last_online_text(now - logged_off),
            None => "Offline".to_string(),
        },
        PersonaState::Online => player.current_game().unwrap_or("Online").to_string(),
        PersonaState::Away => player.current_game().unwrap_or("Away").to_string(),
        PersonaState::LookingTo => "Online".to_string(),
        PersonaState::Unknown => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn durations() {
        assert_eq!(format_play_duration(59), "0 min");
        assert_eq!(format_play_duration(125 * 60), "2 h 5 min");
        assert_eq!(format_play_duration(45 * 60), "45 min");
        assert_eq!(format_play_duration(-10), "0 min");
    }

    #[test]
    fn last_online_buckets() {
        assert_eq!(last_online_text(10), "Last online just now");
        assert_eq!(last_online_text(600), "Last online 10 min ago");
        assert_eq!(last_online_text(7200), "Last online 2 h ago");
        assert_eq!(last_online_text(3 * 86400), "Last online 3 d ago");
        assert_eq!(last_online_text(2 * 2_592_000), "Last online 2 mo ago");
        assert_eq!(last_online_text(31_536_000), "Last online 1 y ago");
    }

    #[test]
    fn status_by_persona_state() {
        let mut p = PlayerSnapshot { personastate: 0, ..Default::default() };
        assert_eq!(persona_status_text(&p, 1000), "Offline");
        p.lastlogoff = Some(400);
        assert_eq!(persona_status_text(&p, 1000), "Last online 10 min ago");

        p.personastate = 4;
        assert_eq!(persona_status_text(&p, 1000), "Online");
        p.gameextrainfo = Some("Dota 2".into());
        assert_eq!(persona_status_text(&p, 1000), "Dota 2");
        p.personastate = 3;
        assert_eq!(persona_status_text(&p, 1000), "Dota 2");
        p.gameextrainfo = None;
        assert_eq!(persona_status_text(&p, 1000), "Away");
        p.personastate = 6;
        assert_eq!(persona_status_text(&p, 1000), "Online");
        p.personastate = 9;
        assert_eq!(persona_status_text(&p, 1000), "Unknown");
    }

    #[test]
    fn shanghai_day_rolls_over_at_16_utc() {
        let before = Utc.with_ymd_and_hms(2026, 3, 1, 15, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 16, 0, 0).unwrap();
        assert_eq!(shanghai_today(before), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(shanghai_today(after), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }
}
