//! Scrapes the public community profile page for the `steam info` card.

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;
use madoka_common::models::{PlayerData, RecentGame};
use crate::http::HttpClient;

pub const PROFILE_URL: &str = "https://steamcommunity.com/profiles";

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>Steam Community :: (.*?)</title>").expect("valid regex"));
static SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<div class="profile_summary">(.*?)</div>"#).expect("valid regex"));
static RECENT_PLAYTIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="recentgame_quicklinks recentgame_recentplaytime">\s*<div>(.*?)</div>"#)
        .expect("valid regex")
});
static GAME_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="recent_game\b.*?<div class="game_name">(.*?)</div>"#).expect("valid regex")
});
static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static EMOTICON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"ː.*?ː").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<.*?>").expect("valid regex"));

/// Images used when the page (or a field on it) is unavailable.
#[derive(Debug, Clone, Default)]
pub struct ProfileDefaults {
    pub avatar: Vec<u8>,
    pub background: Vec<u8>,
}

impl ProfileDefaults {
    pub fn player_data(&self) -> PlayerData {
        PlayerData {
            description: "No information given.".to_string(),
            background: self.background.clone(),
            avatar: self.avatar.clone(),
            player_name: "Unknown".to_string(),
            recent_2_week_play_time: None,
            game_data: Vec::new(),
        }
    }
}

/// Fetches and parses the profile page. Never fails: a request error yields the
/// defaults, a field that cannot be found keeps its default.
pub async fn fetch_profile_page(http: &dyn HttpClient, steam_id: &str, defaults: &ProfileDefaults) -> PlayerData {
    let url = format!("{PROFILE_URL}/{steam_id}?l=english");
    let offset_secs = Local::now().offset().local_minus_utc();
    let headers = vec![
        ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        (
            "Cookie".to_string(),
            format!("timezoneOffset={offset_secs},0; steamLanguage=english; wants_mature_content=1"),
        ),
    ];

    match http.get_text(&url, &headers).await {
        Ok(html) => parse_profile_page(&html, defaults),
        Err(e) => {
            error!("Failed to fetch profile page for {}: {}", steam_id, e);
            defaults.player_data()
        }
    }
}

pub fn parse_profile_page(html: &str, defaults: &ProfileDefaults) -> PlayerData {
    let mut result = defaults.player_data();

    if let Some(c) = TITLE_RE.captures(html) {
        result.player_name = decode_entities(c[1].trim());
    }

    if let Some(c) = SUMMARY_RE.captures(html) {
        let desc = BR_RE.replace_all(&c[1], "\n");
        let desc = desc.replace('\t', "");
        let desc = EMOTICON_RE.replace_all(&desc, "");
        let desc = TAG_RE.replace_all(&desc, "");
        result.description = decode_entities(desc.trim());
    }

    if let Some(c) = RECENT_PLAYTIME_RE.captures(html) {
        let text = TAG_RE.replace_all(&c[1], "");
        result.recent_2_week_play_time = Some(decode_entities(text.trim()));
    }

    result.game_data = GAME_NAME_RE
        .captures_iter(html)
        .map(|c| {
            let name = TAG_RE.replace_all(&c[1], "");
            RecentGame { game_name: decode_entities(name.trim()) }
        })
        .filter(|g| !g.game_name.is_empty())
        .collect();

    result
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Steam Community :: Madoka</title></head>
<body>
<div class="profile_summary">
	Hello<br>world ːsteamhappyː <a href="x">link</a>
</div>
<div class="recentgame_quicklinks recentgame_recentplaytime">
	<div>12.5 hours past 2 weeks</div>
</div>
<div class="recent_game">
  <div class="recent_game_content">
    <div class="game_info">
      <div class="game_name"><a class="whiteLink" href="https://steamcommunity.com/app/570">Dota 2</a></div>
    </div>
  </div>
</div>
<div class="recent_game">
      <div class="game_name">Portal &amp; Friends</div>
</div>
</body></html>"#;

    #[test]
    fn extracts_name_description_and_games() {
        let data = parse_profile_page(PAGE, &ProfileDefaults::default());
        assert_eq!(data.player_name, "Madoka");
        assert_eq!(data.description, "Hello\nworld  link");
        assert_eq!(data.recent_2_week_play_time.as_deref(), Some("12.5 hours past 2 weeks"));
        let names: Vec<_> = data.game_data.iter().map(|g| g.game_name.as_str()).collect();
        assert_eq!(names, vec!["Dota 2", "Portal & Friends"]);
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let defaults = ProfileDefaults { avatar: vec![1], background: vec![2] };
        let data = parse_profile_page("<html>private</html>", &defaults);
        assert_eq!(data.player_name, "Unknown");
        assert_eq!(data.description, "No information given.");
        assert_eq!(data.avatar, vec![1]);
        assert!(data.game_data.is_empty());
    }
}
