use async_trait::async_trait;
use crate::error::Error;
use crate::models::{GroupInfo, OutgoingMessage};

/// The messaging surface of the chat framework hosting the bot.
#[async_trait]
pub trait ChatHost: Send + Sync {
    async fn send_group_message(&self, group_id: &str, message: OutgoingMessage) -> Result<(), Error>;

    /// Group card or nickname of a member, if the host knows them.
    async fn member_display_name(&self, group_id: &str, user_id: &str) -> Result<Option<String>, Error>;

    async fn group_info(&self, group_id: &str) -> Result<GroupInfo, Error>;
}
