use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, error};
use madoka_common::models::{GroupMessage, IncomingEvent, OutgoingMessage};
use madoka_common::traits::ChatHost;
use crate::services::echo_service::EchoService;
use crate::services::poke_service::PokeService;
use crate::services::settings_service::SettingsService;
use crate::services::sign_service::SignService;
use crate::services::steam::SteamCommandService;
use crate::Error;

/// Routes host events to the feature that owns them and sends the replies back.
pub struct MessageService {
    host: Arc<dyn ChatHost>,
    echo: EchoService,
    poke: PokeService,
    sign: Arc<SignService>,
    settings: SettingsService,
    steam: SteamCommandService,
}

impl MessageService {
    pub fn new(
        host: Arc<dyn ChatHost>,
        echo: EchoService,
        poke: PokeService,
        sign: Arc<SignService>,
        settings: SettingsService,
        steam: SteamCommandService,
    ) -> Self {
        Self { host, echo, poke, sign, settings, steam }
    }

    /// Handles one event and sends whatever it produced. Send failures are logged,
    /// not returned.
    pub async fn process_event(&self, event: IncomingEvent) -> Result<(), Error> {
        let group_id = match &event {
            IncomingEvent::GroupMessage(m) => m.group_id.clone(),
            IncomingEvent::Poke(p) => p.group_id.clone(),
        };
        for reply in self.replies_for(&event).await {
            if let Err(e) = self.host.send_group_message(&group_id, reply).await {
                error!("Failed to send reply to group {}: {}", group_id, e);
            }
        }
        Ok(())
    }

    pub async fn replies_for(&self, event: &IncomingEvent) -> Vec<OutgoingMessage> {
        match event {
            IncomingEvent::Poke(notice) => self.poke.handle(notice).into_iter().collect(),
            IncomingEvent::GroupMessage(msg) => self.message_replies(msg).await,
        }
    }

    async fn message_replies(&self, msg: &GroupMessage) -> Vec<OutgoingMessage> {
        debug!("message in {} from {}: '{}'", msg.group_id, msg.user_id, msg.text);

        if let Some(reply) = self.echo.handle(msg, Utc::now()) {
            return vec![reply];
        }
        if let Some(replies) = self.sign.handle(msg).await {
            return replies;
        }

        let routed = match self.settings.handle(msg).await {
            Ok(None) => self.steam.handle(msg).await,
            other => other,
        };
        match routed {
            Ok(Some(replies)) => replies,
            Ok(None) => Vec::new(),
            Err(e) => {
                error!("Command '{}' from {} failed: {}", msg.text, msg.user_id, e);
                vec![OutgoingMessage::text("Something went wrong, please try again later.")]
            }
        }
    }
}
