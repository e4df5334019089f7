use crate::error::Error;
use crate::models::{FriendStatus, PlayerCard, SignCard};

/// Turns drawing inputs into encoded image bytes.
pub trait Renderer: Send + Sync {
    fn start_gaming(
        &self,
        avatar: &[u8],
        name: &str,
        game: &str,
        nickname: Option<&str>,
    ) -> Result<Vec<u8>, Error>;

    fn friends_status(
        &self,
        parent_avatar: &[u8],
        parent_name: &str,
        friends: &[FriendStatus],
    ) -> Result<Vec<u8>, Error>;

    fn player_card(&self, card: &PlayerCard) -> Result<Vec<u8>, Error>;

    fn sign_card(&self, card: &SignCard) -> Result<Vec<u8>, Error>;

    /// Stacks images top to bottom into one.
    fn concat_vertical(&self, images: &[Vec<u8>]) -> Result<Vec<u8>, Error>;
}
