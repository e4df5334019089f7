//! A line-oriented stand-in for the chat framework.
//!
//! Reads events from stdin, one per line:
//!
//! ```text
//! <group> <user> [admin] <text...>
//! poke <group> <user> <target>
//! ```
//!
//! Text replies go to stdout; images are written to the outbox directory.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use madoka_common::models::{GroupInfo, GroupMessage, IncomingEvent, MessageSegment, OutgoingMessage, PokeNotice};
use madoka_common::traits::ChatHost;
use madoka_core::services::MessageService;
use madoka_core::Error;

pub struct ConsoleHost {
    outbox: PathBuf,
    counter: AtomicU64,
}

impl ConsoleHost {
    pub fn new(outbox: PathBuf) -> Self {
        Self {
            outbox,
            counter: AtomicU64::new(0),
        }
    }

    async fn write_image(&self, group_id: &str, bytes: &[u8]) -> Result<PathBuf, Error> {
        tokio::fs::create_dir_all(&self.outbox).await?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = self
            .outbox
            .join(format!("{group_id}_{n:05}.{}", image_extension(bytes)));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

#[async_trait]
impl ChatHost for ConsoleHost {
    async fn send_group_message(&self, group_id: &str, message: OutgoingMessage) -> Result<(), Error> {
        for segment in &message.segments {
            match segment {
                MessageSegment::Text(text) => println!("[{group_id}] {text}"),
                MessageSegment::Image(bytes) => {
                    let path = self.write_image(group_id, bytes).await?;
                    println!("[{group_id}] <image {}>", path.display());
                }
                MessageSegment::Audio(path) => println!("[{group_id}] <audio {}>", path.display()),
            }
        }
        Ok(())
    }

    async fn member_display_name(&self, _group_id: &str, _user_id: &str) -> Result<Option<String>, Error> {
        Ok(None)
    }

    async fn group_info(&self, group_id: &str) -> Result<GroupInfo, Error> {
        Ok(GroupInfo {
            name: format!("Group {group_id}"),
            avatar: None,
        })
    }
}

fn image_extension(bytes: &[u8]) -> &'static str {
    let head = &bytes[..bytes.len().min(64)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    if head.starts_with("<svg") || head.starts_with("<?xml") {
        "svg"
    } else if bytes.starts_with(b"\x89PNG") {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        "jpg"
    } else {
        "bin"
    }
}

/// Parses one console line into an event. `None` for blank or malformed lines.
pub fn parse_line(line: &str, self_id: &str) -> Option<IncomingEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut parts = line.split_whitespace();
    let first = parts.next()?;

    if first == "poke" {
        let group_id = parts.next()?.to_string();
        let user_id = parts.next()?.to_string();
        let target_id = parts.next()?.to_string();
        return Some(IncomingEvent::Poke(PokeNotice {
            group_id,
            user_id,
            target_id,
            self_id: self_id.to_string(),
        }));
    }

    let group_id = first.to_string();
    let user_id = parts.next()?.to_string();
    let mut rest: Vec<&str> = parts.collect();
    let is_admin = rest.first() == Some(&"admin");
    if is_admin {
        rest.remove(0);
    }
    if rest.is_empty() {
        return None;
    }
    Some(IncomingEvent::GroupMessage(GroupMessage {
        group_id,
        sender_name: user_id.clone(),
        user_id,
        is_admin,
        text: rest.join(" "),
        sent_at: Utc::now(),
    }))
}

/// Feeds stdin lines to `service` until EOF.
pub async fn run(host: Arc<ConsoleHost>, service: Arc<MessageService>, self_id: String) -> Result<(), Error> {
    debug!("Console host reading stdin; images go to {}", host.outbox.display());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(event) = parse_line(&line, &self_id) else {
            if !line.trim().is_empty() {
                warn!("Ignoring malformed line: {}", line);
            }
            continue;
        };
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = service.process_event(event).await {
                warn!("Event handling failed: {}", e);
            }
        });
    }
    Ok(())
}
