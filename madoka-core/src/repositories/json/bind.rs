use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use madoka_common::models::BindRecord;
use crate::repositories::json::JsonStore;
use crate::Error;

type BindMap = BTreeMap<String, Vec<BindRecord>>;

/// group id → ordered bind records (`bind_data.json`).
pub struct BindStore {
    store: JsonStore<BindMap>,
}

impl BindStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self { store: JsonStore::load(path).await? })
    }

    pub fn get(&self, group_id: &str, user_id: &str) -> Option<BindRecord> {
        self.store.read(|m| {
            m.get(group_id)?
                .iter()
                .find(|r| r.user_id == user_id)
                .cloned()
        })
    }

    pub fn get_by_steam_id(&self, group_id: &str, steam_id: &str) -> Option<BindRecord> {
        self.store.read(|m| {
            m.get(group_id)?
                .iter()
                .find(|r| r.steam_id == steam_id)
                .cloned()
        })
    }

    /// Steam ids bound in the group, in bind order.
    pub fn get_all(&self, group_id: &str) -> Vec<String> {
        self.store.read(|m| {
            m.get(group_id)
                .map(|records| records.iter().map(|r| r.steam_id.clone()).collect())
                .unwrap_or_default()
        })
    }

    pub fn records(&self, group_id: &str) -> Vec<BindRecord> {
        self.store.read(|m| m.get(group_id).cloned().unwrap_or_default())
    }

    /// Snapshot of every group's steam ids.
    pub fn bind_map(&self) -> HashMap<String, Vec<String>> {
        self.store.read(|m| {
            m.iter()
                .map(|(group, records)| {
                    (group.clone(), records.iter().map(|r| r.steam_id.clone()).collect())
                })
                .collect()
        })
    }

    /// Creates the record or rebinds an existing one (keeping its nickname).
    /// Returns `true` when the record is new.
    pub async fn upsert(&self, group_id: &str, user_id: &str, steam_id: &str) -> Result<bool, Error> {
        self.store
            .mutate(|m| {
                let records = m.entry(group_id.to_string()).or_default();
                match records.iter_mut().find(|r| r.user_id == user_id) {
                    Some(existing) => {
                        existing.steam_id = steam_id.to_string();
                        false
                    }
                    None => {
                        records.push(BindRecord::new(user_id, steam_id));
                        true
                    }
                }
            })
            .await
    }

    /// Returns `false` when the user had no record in the group.
    pub async fn remove(&self, group_id: &str, user_id: &str) -> Result<bool, Error> {
        if self.get(group_id, user_id).is_none() {
            return Ok(false);
        }
        self.store
            .mutate(|m| {
                let Some(records) = m.get_mut(group_id) else {
                    return false;
                };
                let before = records.len();
                records.retain(|r| r.user_id != user_id);
                let removed = records.len() != before;
                if records.is_empty() {
                    m.remove(group_id);
                }
                removed
            })
            .await
    }

    /// Sets or clears the nickname. Returns `false` when the user is not bound.
    pub async fn set_nickname(&self, group_id: &str, user_id: &str, nickname: Option<String>) -> Result<bool, Error> {
        if self.get(group_id, user_id).is_none() {
            return Ok(false);
        }
        self.store
            .mutate(|m| {
                match m
                    .get_mut(group_id)
                    .and_then(|records| records.iter_mut().find(|r| r.user_id == user_id))
                {
                    Some(record) => {
                        record.nickname = nickname;
                        true
                    }
                    None => false,
                }
            })
            .await
    }
}
