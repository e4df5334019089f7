use std::sync::Arc;
use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Asia::Shanghai;
use dashmap::{DashMap, DashSet};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use madoka_common::models::{GroupMessage, OutgoingMessage, SignCard, SignRecord, SignReward, UserStats};
use madoka_common::traits::{RewardRepository, Renderer};
use crate::assets::{AssetManager, ResType, SubFolder};
use crate::config::SignConfig;
use crate::utils::shanghai_today;
use crate::Error;

/// What a sign-in attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum SignOutcome {
    Signed {
        stats: UserStats,
        record: SignRecord,
        reward: SignReward,
    },
    AlreadySigned {
        stats: UserStats,
        record: SignRecord,
    },
    /// Another sign-in for the same user is still running.
    Busy,
}

/// Random base of 3..=6 plus a streak bonus capped at 10, and 0..=1 favour.
pub fn calculate_reward<R: Rng + ?Sized>(continuous_days: i64, rng: &mut R) -> SignReward {
    let bonus_point = (continuous_days - 1).clamp(0, 10);
    SignReward {
        reward_points: rng.random_range(3..=6),
        bonus_point,
        reward_favor: rng.random_range(0..=1),
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Quote {
    #[serde(alias = "时间")]
    time: String,
    #[serde(alias = "好感")]
    favor: String,
    #[serde(alias = "台词")]
    line: String,
}

fn time_tag(hour: u32) -> &'static str {
    match hour {
        5..=6 => "early morning",
        7..=10 => "morning",
        11..=12 => "noon",
        13..=16 => "afternoon",
        17..=18 => "dusk",
        19..=23 => "night",
        _ => "late night",
    }
}

fn favor_tag(favorability: i64) -> &'static str {
    match favorability {
        f if f < 30 => "low",
        f if f < 60 => "medium",
        _ => "high",
    }
}

/// Removes the user from the in-progress set however the sign-in ends.
struct InProgress<'a> {
    set: &'a DashSet<String>,
    user_id: String,
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.user_id);
    }
}

pub struct SignService {
    repo: Arc<dyn RewardRepository>,
    renderer: Arc<dyn Renderer>,
    assets: AssetManager,
    config: SignConfig,
    locks: DashMap<String, Arc<Mutex<()>>>,
    in_progress: DashSet<String>,
}

impl SignService {
    pub fn new(
        repo: Arc<dyn RewardRepository>,
        renderer: Arc<dyn Renderer>,
        assets: AssetManager,
        config: SignConfig,
    ) -> Self {
        Self {
            repo,
            renderer,
            assets,
            config,
            locks: DashMap::new(),
            in_progress: DashSet::new(),
        }
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        let text = text.trim();
        self.config.keywords.iter().any(|k| k == text)
    }

    /// Signs `user_id` in for the Shanghai calendar day containing `now`.
    ///
    /// A second request arriving while the first is still running returns
    /// [`SignOutcome::Busy`] instead of queuing.
    pub async fn sign_in(&self, user_id: &str, now: DateTime<Utc>) -> Result<SignOutcome, Error> {
        if !self.in_progress.insert(user_id.to_string()) {
            debug!("Sign-in already running for {}", user_id);
            return Ok(SignOutcome::Busy);
        }
        let _in_progress = InProgress { set: &self.in_progress, user_id: user_id.to_string() };

        let outcome = {
            let lock = self.locks.entry(user_id.to_string()).or_default().clone();
            let _guard = lock.lock().await;
            self.sign_in_locked(user_id, now).await
        };
        // Nobody else holds the lock once only the map's copy is left.
        self.locks.remove_if(user_id, |_, lock| Arc::strong_count(lock) == 1);
        outcome
    }

    async fn sign_in_locked(&self, user_id: &str, now: DateTime<Utc>) -> Result<SignOutcome, Error> {
        let (mut stats, mut record) = self.repo.get_or_create(user_id, &self.config.default_skin).await?;
        let today = shanghai_today(now);
        let last_day = record.last_sign_date.map(shanghai_today);
        if last_day == Some(today) {
            return Ok(SignOutcome::AlreadySigned { stats, record });
        }

        record.continuous_days = if last_day == Some(today - Duration::days(1)) {
            record.continuous_days + 1
        } else {
            1
        };
        let reward = calculate_reward(record.continuous_days, &mut rand::rng());

        stats.points += reward.total_points();
        stats.favorability += reward.reward_favor;
        record.total_count += 1;
        record.last_sign_date = Some(now);
        self.repo.record_sign(&stats, &record).await?;

        info!(
            "User {} signed in: +{} points, +{} favour, streak {}",
            user_id,
            reward.total_points(),
            reward.reward_favor,
            record.continuous_days
        );
        Ok(SignOutcome::Signed { stats, record, reward })
    }

    /// Chat entry point for the sign-in keywords. `None` when `msg` is not one.
    pub async fn handle(&self, msg: &GroupMessage) -> Option<Vec<OutgoingMessage>> {
        if !self.is_keyword(&msg.text) {
            return None;
        }
        let outcome = match self.sign_in(&msg.user_id, Utc::now()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Sign-in failed for {}: {}", msg.user_id, e);
                return Some(vec![OutgoingMessage::text(
                    "Sorry, Madoka is not in the mood right now. Try again later.",
                )]);
            }
        };

        let (prefix, stats, record, reward) = match outcome {
            SignOutcome::Busy => return Some(Vec::new()),
            SignOutcome::Signed { stats, record, reward } => {
                ("Signed in! Fetching your data...", stats, record, Some(reward))
            }
            SignOutcome::AlreadySigned { stats, record } => {
                ("You have already signed in today. Generating your profile...", stats, record, None)
            }
        };

        let mut replies = vec![OutgoingMessage::text(prefix)];
        match self.render_card(&msg.sender_name, stats, record, reward) {
            Ok(image) => replies.push(OutgoingMessage::image(image)),
            Err(e) => {
                error!("Failed to render sign card for {}: {}", msg.user_id, e);
                replies.push(OutgoingMessage::text(format!("Render failed: {e}")));
            }
        }
        Some(replies)
    }

    /// The stats card; also used by `query profile`.
    pub fn render_card(
        &self,
        user_name: &str,
        stats: UserStats,
        record: SignRecord,
        reward: Option<SignReward>,
    ) -> Result<Vec<u8>, Error> {
        let skins = self.assets.indexed_files(ResType::Image, SubFolder::Char, "skin");
        let skin_path = skins
            .get(&stats.skin_key)
            .or_else(|| skins.values().next())
            .cloned();
        let skin_name = skin_path
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| stats.skin_key.clone());
        let skin_image = skin_path.and_then(|p| match std::fs::read(&p) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Could not read skin {}: {}", p.display(), e);
                None
            }
        });
        let quote = self.pick_quote(stats.favorability, Utc::now());

        self.renderer.sign_card(&SignCard {
            user_name: user_name.to_string(),
            stats,
            record,
            reward,
            skin_name,
            skin_image,
            quote,
        })
    }

    pub async fn load_profile(&self, user_id: &str) -> Result<(UserStats, SignRecord), Error> {
        self.repo.get_or_create(user_id, &self.config.default_skin).await
    }

    fn pick_quote(&self, favorability: i64, now: DateTime<Utc>) -> String {
        let Some(path) = self.assets.file(ResType::Json, SubFolder::Sign, "quotes.json") else {
            return "(quote data file not found)".to_string();
        };
        let quotes: Vec<Quote> = match std::fs::read(&path)
            .map_err(Error::from)
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(Error::from))
        {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                return "...tch, something went wrong.".to_string();
            }
        };

        let time = time_tag(now.with_timezone(&Shanghai).hour());
        let favor = favor_tag(favorability);
        let matching: Vec<&Quote> = quotes
            .iter()
            .filter(|q| q.time == time && q.favor == favor)
            .collect();
        matching
            .choose(&mut rand::rng())
            .map(|q| q.line.clone())
            .unwrap_or_else(|| "...nothing to say.".to_string())
    }
}
