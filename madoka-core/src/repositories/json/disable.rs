use std::collections::BTreeSet;
use std::path::PathBuf;
use crate::repositories::json::JsonStore;
use crate::Error;

/// Groups that opted out of broadcasts (`disable_parent_data.json`).
pub struct DisableStore {
    store: JsonStore<BTreeSet<String>>,
}

impl DisableStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self { store: JsonStore::load(path).await? })
    }

    pub fn is_disabled(&self, group_id: &str) -> bool {
        self.store.read(|s| s.contains(group_id))
    }

    /// `false` when the group was already disabled.
    pub async fn add(&self, group_id: &str) -> Result<bool, Error> {
        self.store.mutate(|s| s.insert(group_id.to_string())).await
    }

    /// `false` when the group was not disabled.
    pub async fn remove(&self, group_id: &str) -> Result<bool, Error> {
        self.store.mutate(|s| s.remove(group_id)).await
    }
}
