use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct UserStats {
    pub user_id: String,
    pub points: i64,
    pub favorability: i64,
    pub skin_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct SignRecord {
    pub user_id: String,
    pub last_sign_date: Option<DateTime<Utc>>,
    pub continuous_days: i64,
    pub total_count: i64,
}

/// A skin the user owns. Ownership is checked before `set skin` switches to it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct UserSkin {
    pub user_id: String,
    pub skin_key: String,
}

/// What one successful sign-in granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignReward {
    pub reward_points: i64,
    pub bonus_point: i64,
    pub reward_favor: i64,
}

impl SignReward {
    pub fn total_points(&self) -> i64 {
        self.reward_points + self.bonus_point
    }
}
