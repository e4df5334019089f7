use tracing::debug;
use madoka_common::models::{OutgoingMessage, PokeNotice};
use crate::assets::{AssetManager, ResType, SubFolder};

/// Answers pokes aimed at the bot with a random voice line.
pub struct PokeService {
    assets: AssetManager,
}

impl PokeService {
    pub fn new(assets: AssetManager) -> Self {
        Self { assets }
    }

    /// `None` for pokes between other members.
    pub fn handle(&self, notice: &PokeNotice) -> Option<OutgoingMessage> {
        if notice.target_id != notice.self_id {
            return None;
        }
        match self.assets.random_file(ResType::Audio, SubFolder::Poke) {
            Some(path) => {
                debug!("Poke from {} in {}: {}", notice.user_id, notice.group_id, path.display());
                Some(OutgoingMessage::audio(path))
            }
            None => Some(OutgoingMessage::text(format!(
                "missing resource: {}/{}",
                ResType::Audio.as_str(),
                SubFolder::Poke.as_str()
            ))),
        }
    }
}
