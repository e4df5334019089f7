use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;
use madoka_common::models::ParentMeta;
use crate::repositories::json::JsonStore;
use crate::Error;

/// Group display metadata (`parent_data.json`). Avatars are kept as files next to it.
pub struct ParentStore {
    store: JsonStore<BTreeMap<String, ParentMeta>>,
    avatar_dir: PathBuf,
}

impl ParentStore {
    pub async fn load(path: impl Into<PathBuf>, avatar_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self {
            store: JsonStore::load(path).await?,
            avatar_dir: avatar_dir.into(),
        })
    }

    pub fn get(&self, group_id: &str) -> Option<ParentMeta> {
        self.store.read(|m| m.get(group_id).cloned())
    }

    /// Writes the avatar (when given) and records the new name. The group id names the
    /// avatar file, so only ASCII letters, digits, `-` and `_` are accepted.
    pub async fn update(&self, group_id: &str, avatar: Option<&[u8]>, name: &str) -> Result<(), Error> {
        if !is_safe_file_stem(group_id) {
            return Err(Error::Parse(format!("invalid group id {group_id:?}")));
        }
        let avatar_path = match avatar {
            Some(bytes) if !bytes.is_empty() => {
                tokio::fs::create_dir_all(&self.avatar_dir).await?;
                let path = self.avatar_dir.join(format!("{group_id}.png"));
                tokio::fs::write(&path, bytes).await?;
                Some(path)
            }
            _ => None,
        };
        self.store
            .mutate(|m| {
                let meta = m.entry(group_id.to_string()).or_default();
                meta.name = Some(name.to_string());
                if avatar_path.is_some() {
                    meta.avatar_path = avatar_path;
                }
            })
            .await
    }

    /// Stored avatar bytes for the group, if any were saved and still readable.
    pub async fn avatar_bytes(&self, group_id: &str) -> Option<Vec<u8>> {
        let path = self.get(group_id)?.avatar_path?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to read group avatar {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn is_safe_file_stem(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
