use async_trait::async_trait;
use crate::error::Error;
use crate::models::{SignRecord, UserStats};

/// Points, favourability, sign-in streaks and owned skins.
#[async_trait]
pub trait RewardRepository: Send + Sync {
    /// Loads the user's stats and sign record, creating both (and ownership of
    /// `default_skin`) on first touch.
    async fn get_or_create(
        &self,
        user_id: &str,
        default_skin: &str,
    ) -> Result<(UserStats, SignRecord), Error>;

    async fn get_stats(&self, user_id: &str) -> Result<Option<UserStats>, Error>;

    /// Writes a completed sign-in: both rows in one transaction.
    async fn record_sign(&self, stats: &UserStats, record: &SignRecord) -> Result<(), Error>;

    async fn owns_skin(&self, user_id: &str, skin_key: &str) -> Result<bool, Error>;

    /// `false` when the user already owns it or does not exist.
    async fn add_skin(&self, user_id: &str, skin_key: &str) -> Result<bool, Error>;

    async fn set_current_skin(&self, user_id: &str, skin_key: &str) -> Result<(), Error>;
}
