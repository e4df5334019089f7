use std::path::PathBuf;
use serde::{Deserialize, Serialize};

/// Association between one group member and a Steam account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindRecord {
    pub user_id: String,
    pub steam_id: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl BindRecord {
    pub fn new(user_id: impl Into<String>, steam_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            steam_id: steam_id.into(),
            nickname: None,
        }
    }
}

/// Display metadata for a group, shown as the header of the friends board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentMeta {
    pub name: Option<String>,
    pub avatar_path: Option<PathBuf>,
}
