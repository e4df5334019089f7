use chrono::{DateTime, Utc};
use madoka_common::models::{GroupMessage, OutgoingMessage};
use crate::config::EchoConfig;

/// Liveness check: replies to its keywords with the message latency.
pub struct EchoService {
    config: EchoConfig,
}

impl EchoService {
    pub fn new(config: EchoConfig) -> Self {
        Self { config }
    }

    pub fn handle(&self, msg: &GroupMessage, now: DateTime<Utc>) -> Option<OutgoingMessage> {
        let text = msg.text.trim();
        if !self.config.keywords.iter().any(|k| k == text) {
            return None;
        }
        let latency_ms = (now - msg.sent_at).num_milliseconds().max(0);
        Some(OutgoingMessage::text(format!("{} ({}ms)", self.config.reply, latency_ms)))
    }
}
