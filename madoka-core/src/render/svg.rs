//! SVG implementation of [`Renderer`]. Every card is a standalone SVG document with
//! its images inlined as base64 data URIs, so the host can forward the bytes as-is
//! or rasterise them.

use std::fmt::Write as _;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use madoka_common::models::{FriendStatus, PlayerCard, SignCard};
use madoka_common::traits::Renderer;
use crate::Error;

const FONT: &str = "sans-serif";
const BOARD_WIDTH: u32 = 400;
const BOARD_HEADER: u32 = 120;
const BOARD_ROW: u32 = 64;
const GAMING_WIDTH: u32 = 480;
const GAMING_HEIGHT: u32 = 120;
const CARD_WIDTH: u32 = 800;
const SIGN_WIDTH: u32 = 720;
const SIGN_HEIGHT: u32 = 480;

static ROOT_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<svg\b[^>]*?\bwidth="(\d+)"[^>]*?\bheight="(\d+)""#).expect("valid regex")
});

/// Status colours on the friends board, by persona bucket.
fn status_colour(friend: &FriendStatus) -> &'static str {
    match friend.personastate {
        0 => "#969696",
        1 | 2 | 4 if friend.status != "Online" => "#e3ffc2",
        3 => "#e0c36a",
        1..=6 => "#6dcff6",
        _ => "#969696",
    }
}

pub(crate) fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ if looks_like_svg(bytes) => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || head.starts_with("<?xml")
}

fn data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Cuts `text` to `max` chars, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Width and height declared on a document's root `<svg>`.
pub(crate) fn svg_size(bytes: &[u8]) -> Option<(u32, u32)> {
    let text = std::str::from_utf8(bytes).ok()?;
    let caps = ROOT_SIZE.captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

struct Doc {
    width: u32,
    height: u32,
    body: String,
}

impl Doc {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, body: String::new() }
    }

    fn rect(&mut self, x: u32, y: u32, w: u32, h: u32, fill: &str) {
        let _ = writeln!(self.body, r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}"/>"#);
    }

    fn image(&mut self, x: u32, y: u32, w: u32, h: u32, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let _ = writeln!(
            self.body,
            r#"<image x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="xMidYMid slice" href="{}"/>"#,
            data_uri(bytes)
        );
    }

    fn text(&mut self, x: u32, y: u32, size: u32, fill: &str, text: &str) {
        let _ = writeln!(
            self.body,
            r#"<text x="{x}" y="{y}" font-family="{FONT}" font-size="{size}" fill="{fill}">{}</text>"#,
            escape(text)
        );
    }

    fn finish(self) -> Vec<u8> {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
{body}</svg>
"#,
            w = self.width,
            h = self.height,
            body = self.body
        )
        .into_bytes()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SvgRenderer;

impl SvgRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for SvgRenderer {
    fn start_gaming(
        &self,
        avatar: &[u8],
        name: &str,
        game: &str,
        nickname: Option<&str>,
    ) -> Result<Vec<u8>, Error> {
        let mut doc = Doc::new(GAMING_WIDTH, GAMING_HEIGHT);
        doc.rect(0, 0, GAMING_WIDTH, GAMING_HEIGHT, "#1e2024");
        doc.image(16, 16, 88, 88, avatar);
        let title = match nickname {
            Some(nick) if !nick.is_empty() => format!("{name} ({nick})"),
            _ => name.to_string(),
        };
        doc.text(120, 44, 22, "#e3ffc2", &truncate(&title, 28));
        doc.text(120, 72, 16, "#969696", "is now playing");
        doc.text(120, 100, 20, "#91c257", &truncate(game, 32));
        Ok(doc.finish())
    }

    fn friends_status(
        &self,
        parent_avatar: &[u8],
        parent_name: &str,
        friends: &[FriendStatus],
    ) -> Result<Vec<u8>, Error> {
        let height = BOARD_HEADER + BOARD_ROW * friends.len().max(1) as u32 + 16;
        let mut doc = Doc::new(BOARD_WIDTH, height);
        doc.rect(0, 0, BOARD_WIDTH, height, "#1e2024");
        doc.image(16, 16, 72, 72, parent_avatar);
        doc.text(104, 48, 22, "#ffffff", &truncate(parent_name, 22));
        let online = friends.iter().filter(|f| f.personastate != 0).count();
        doc.text(104, 76, 14, "#969696", &format!("{online}/{} online", friends.len()));

        if friends.is_empty() {
            doc.text(16, BOARD_HEADER + 36, 16, "#969696", "Nobody is bound in this group yet");
        }
        for (i, friend) in friends.iter().enumerate() {
            let y = BOARD_HEADER + BOARD_ROW * i as u32;
            doc.image(16, y + 4, 50, 50, &friend.avatar);
            let name = match &friend.nickname {
                Some(nick) if !nick.is_empty() => format!("{} ({nick})", friend.name),
                _ => friend.name.clone(),
            };
            let colour = status_colour(friend);
            doc.text(80, y + 24, 17, colour, &truncate(&name, 30));
            doc.text(80, y + 46, 14, colour, &truncate(&friend.status, 36));
        }
        Ok(doc.finish())
    }

    fn player_card(&self, card: &PlayerCard) -> Result<Vec<u8>, Error> {
        let description: Vec<&str> = card.description.lines().take(6).collect();
        let games_height = 36 * card.games.len().max(1) as u32;
        let height = 360 + 24 * description.len() as u32 + games_height;

        let mut doc = Doc::new(CARD_WIDTH, height);
        doc.rect(0, 0, CARD_WIDTH, height, "#1b2838");
        doc.image(0, 0, CARD_WIDTH, 240, &card.background);
        doc.image(32, 160, 128, 128, &card.avatar);
        doc.text(180, 230, 30, "#ffffff", &truncate(&card.player_name, 32));
        doc.text(180, 262, 16, "#8f98a0", &format!("Friend code: {}", card.friend_code));

        let mut y = 320;
        for line in &description {
            doc.text(32, y, 16, "#acb2b8", &truncate(line, 80));
            y += 24;
        }

        y += 8;
        doc.text(32, y, 18, "#ffffff", &format!("{} in the past 2 weeks", card.recent_2_week_play_time));
        y += 36;
        if card.games.is_empty() {
            doc.text(48, y, 16, "#8f98a0", "No recent games");
        }
        for game in &card.games {
            doc.text(48, y, 16, "#c7d5e0", &truncate(game, 60));
            y += 36;
        }
        Ok(doc.finish())
    }

    fn sign_card(&self, card: &SignCard) -> Result<Vec<u8>, Error> {
        let mut doc = Doc::new(SIGN_WIDTH, SIGN_HEIGHT);
        doc.rect(0, 0, SIGN_WIDTH, SIGN_HEIGHT, "#fdf2f8");
        if let Some(skin) = &card.skin_image {
            doc.image(SIGN_WIDTH - 300, 0, 300, SIGN_HEIGHT, skin);
        }
        doc.text(32, 64, 30, "#9d174d", &truncate(&card.user_name, 20));

        let mut y = 120;
        if let Some(reward) = &card.reward {
            doc.text(32, y, 20, "#be185d", &format!(
                "Points +{} (streak bonus +{})",
                reward.reward_points, reward.bonus_point
            ));
            y += 36;
            doc.text(32, y, 20, "#be185d", &format!("Favour +{}", reward.reward_favor));
            y += 48;
        }

        let lines = [
            format!("Points: {}", card.stats.points),
            format!("Favour: {}", card.stats.favorability),
            format!("Streak: {} day(s)", card.record.continuous_days),
            format!("Total sign-ins: {}", card.record.total_count),
            format!("Skin: {}", card.skin_name),
        ];
        for line in &lines {
            doc.text(32, y, 18, "#831843", line);
            y += 32;
        }
        if !card.quote.is_empty() {
            doc.text(32, y + 16, 16, "#6b7280", &truncate(&card.quote, 40));
        }
        if let Some(date) = card.record.last_sign_date {
            doc.text(32, SIGN_HEIGHT - 24, 14, "#9ca3af", &format!("Last sign-in {}", date.format("%Y-%m-%d %H:%M UTC")));
        }
        Ok(doc.finish())
    }

    fn concat_vertical(&self, images: &[Vec<u8>]) -> Result<Vec<u8>, Error> {
        if images.is_empty() {
            return Err(Error::Render("nothing to concatenate".into()));
        }
        let sizes = images
            .iter()
            .map(|img| svg_size(img).ok_or_else(|| Error::Render("image has no declared size".into())))
            .collect::<Result<Vec<_>, _>>()?;

        let width = sizes.iter().map(|(w, _)| *w).max().unwrap_or(0);
        let height = sizes.iter().map(|(_, h)| *h).sum();
        let mut doc = Doc::new(width, height);
        let mut y = 0;
        for (img, (w, h)) in images.iter().zip(sizes) {
            doc.image(0, y, w, h, img);
            y += h;
        }
        Ok(doc.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_sniffing() {
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF]), "image/jpeg");
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_mime(b"  <svg xmlns=\"\"/>"), "image/svg+xml");
        assert_eq!(sniff_mime(b"hello"), "application/octet-stream");
    }

    #[test]
    fn text_is_escaped() {
        let svg = SvgRenderer::new()
            .start_gaming(&[], "<Tom & Jerry>", "Portal", None)
            .unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.contains("&lt;Tom &amp; Jerry&gt;"));
        assert!(!svg.contains("<Tom"));
    }

    #[test]
    fn concat_stacks_heights() {
        let r = SvgRenderer::new();
        let a = r.start_gaming(b"\x89PNG", "a", "x", None).unwrap();
        let b = r.start_gaming(b"\x89PNG", "b", "y", Some("bee")).unwrap();
        let out = r.concat_vertical(&[a, b]).unwrap();
        assert_eq!(svg_size(&out), Some((GAMING_WIDTH, GAMING_HEIGHT * 2)));
    }

    #[test]
    fn concat_rejects_empty_input() {
        assert!(SvgRenderer::new().concat_vertical(&[]).is_err());
    }
}
