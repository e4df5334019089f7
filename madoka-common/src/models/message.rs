use std::path::PathBuf;
use chrono::{DateTime, Utc};

/// A group chat line delivered by the host framework.
#[derive(Debug, Clone)]
pub struct GroupMessage {
    pub group_id: String,
    pub user_id: String,
    pub sender_name: String,
    /// Group admin, owner or bot superuser.
    pub is_admin: bool,
    pub text: String,
    /// When the platform says the message was sent; used for echo latency.
    pub sent_at: DateTime<Utc>,
}

/// "Poke" notice: `user_id` poked `target_id`.
#[derive(Debug, Clone)]
pub struct PokeNotice {
    pub group_id: String,
    pub user_id: String,
    pub target_id: String,
    pub self_id: String,
}

#[derive(Debug, Clone)]
pub enum IncomingEvent {
    GroupMessage(GroupMessage),
    Poke(PokeNotice),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageSegment {
    Text(String),
    /// Encoded image document produced by the renderer.
    Image(Vec<u8>),
    /// Local audio file for the host to upload as a voice record.
    Audio(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub segments: Vec<MessageSegment>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self { segments: vec![MessageSegment::Text(text.into())] }
    }

    pub fn image(bytes: Vec<u8>) -> Self {
        Self { segments: vec![MessageSegment::Image(bytes)] }
    }

    pub fn audio(path: PathBuf) -> Self {
        Self { segments: vec![MessageSegment::Audio(path)] }
    }

    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.segments.push(MessageSegment::Image(bytes));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All text segments joined with newlines.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                MessageSegment::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn images(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.segments.iter().filter_map(|s| match s {
            MessageSegment::Image(b) => Some(b),
            _ => None,
        })
    }
}

/// Group name and avatar as reported by the host.
#[derive(Debug, Clone)]
pub struct GroupInfo {
    pub name: String,
    pub avatar: Option<Vec<u8>>,
}
