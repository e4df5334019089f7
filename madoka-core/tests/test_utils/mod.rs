// File: madoka-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::time::Instant;
use madoka_common::models::{GroupInfo, GroupMessage, OutgoingMessage, PlayerSnapshot};
use madoka_common::traits::ChatHost;
use madoka_core::{Error, HttpClient};

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

pub fn player(id: &str, name: &str, game: Option<&str>) -> PlayerSnapshot {
    PlayerSnapshot {
        steamid: id.to_string(),
        personaname: name.to_string(),
        personastate: 1,
        gameextrainfo: game.map(String::from),
        avatarfull: Some(format!("https://avatars.example/{id}.jpg")),
        ..Default::default()
    }
}

pub fn group_message(group: &str, user: &str, admin: bool, text: &str) -> GroupMessage {
    GroupMessage {
        group_id: group.to_string(),
        user_id: user.to_string(),
        sender_name: format!("user{user}"),
        is_admin: admin,
        text: text.to_string(),
        sent_at: chrono::Utc::now(),
    }
}

/// One recorded `GetPlayerSummaries` call.
#[derive(Debug, Clone)]
pub struct SummaryCall {
    pub at: Instant,
    pub ids: Vec<String>,
}

/// Steam stand-in: answers summaries from an in-memory player table and can be told
/// to fail the next N JSON calls.
#[derive(Default)]
pub struct MockSteamHttp {
    players: Mutex<HashMap<String, PlayerSnapshot>>,
    failures_left: AtomicUsize,
    pub calls: Mutex<Vec<SummaryCall>>,
    pub avatar_downloads: AtomicUsize,
    pub profile_html: Mutex<Option<String>>,
}

impl MockSteamHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_player(&self, p: PlayerSnapshot) {
        self.players.lock().insert(p.steamid.clone(), p);
    }

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockSteamHttp {
    async fn get_json(&self, _url: &str, query: &[(String, String)]) -> Result<Value, Error> {
        let ids: Vec<String> = query
            .iter()
            .find(|(k, _)| k == "steamids")
            .map(|(_, v)| v.split(',').map(String::from).collect())
            .unwrap_or_default();
        self.calls.lock().push(SummaryCall { at: Instant::now(), ids: ids.clone() });

        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Platform("mock steam outage".into()));
        }

        let table = self.players.lock();
        let players: Vec<Value> = ids
            .iter()
            .filter_map(|id| table.get(id))
            .map(|p| {
                let mut v = json!({
                    "steamid": p.steamid,
                    "personaname": p.personaname,
                    "personastate": p.personastate,
                    "avatarfull": p.avatarfull,
                });
                if let Some(game) = &p.gameextrainfo {
                    v["gameextrainfo"] = json!(game);
                }
                if let Some(t) = p.lastlogoff {
                    v["lastlogoff"] = json!(t);
                }
                v
            })
            .collect();
        Ok(json!({ "response": { "players": players } }))
    }

    async fn get_text(&self, url: &str, _headers: &[(String, String)]) -> Result<String, Error> {
        self.profile_html
            .lock()
            .clone()
            .ok_or_else(|| Error::Platform(format!("no page for {url}")))
    }

    async fn get_bytes(&self, _url: &str) -> Result<Vec<u8>, Error> {
        self.avatar_downloads.fetch_add(1, Ordering::SeqCst);
        Ok(PNG.to_vec())
    }
}

/// Chat host that records everything sent and can fail sends to chosen groups.
#[derive(Default)]
pub struct RecordingHost {
    pub sent: Mutex<Vec<(String, OutgoingMessage)>>,
    pub failing_groups: Mutex<HashSet<String>>,
    pub names: Mutex<HashMap<(String, String), String>>,
    pub group_name: Mutex<Option<String>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_group(&self, group: &str) {
        self.failing_groups.lock().insert(group.to_string());
    }

    pub fn sent_to(&self, group: &str) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(g, _)| g == group)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl ChatHost for RecordingHost {
    async fn send_group_message(&self, group_id: &str, message: OutgoingMessage) -> Result<(), Error> {
        if self.failing_groups.lock().contains(group_id) {
            return Err(Error::Host(format!("group {group_id} is unreachable")));
        }
        self.sent.lock().push((group_id.to_string(), message));
        Ok(())
    }

    async fn member_display_name(&self, group_id: &str, user_id: &str) -> Result<Option<String>, Error> {
        Ok(self
            .names
            .lock()
            .get(&(group_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn group_info(&self, group_id: &str) -> Result<GroupInfo, Error> {
        match self.group_name.lock().clone() {
            Some(name) => Ok(GroupInfo { name, avatar: Some(PNG.to_vec()) }),
            None => Err(Error::Host(format!("no info for {group_id}"))),
        }
    }
}
