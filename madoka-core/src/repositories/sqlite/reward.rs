// src/repositories/sqlite/reward.rs

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use madoka_common::models::{SignRecord, UserStats};
use madoka_common::traits::RewardRepository;
use crate::Error;

pub struct SqliteRewardRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRewardRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn fetch_record(&self, user_id: &str) -> Result<Option<SignRecord>, Error> {
        let record = sqlx::query_as::<_, SignRecord>(
            r#"
            SELECT user_id, last_sign_date, continuous_days, total_count
            FROM sign_record
            WHERE user_id = ?
            "#,
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }
}

#[async_trait]
impl RewardRepository for SqliteRewardRepository {
    async fn get_or_create(
        &self,
        user_id: &str,
        default_skin: &str,
    ) -> Result<(UserStats, SignRecord), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, points, favorability, skin_key)
            VALUES (?, 0, 0, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
            .bind(user_id)
            .bind(default_skin)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO sign_record (user_id, last_sign_date, continuous_days, total_count)
            VALUES (?, NULL, 0, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_skin (user_id, skin_key)
            VALUES (?, ?)
            ON CONFLICT (user_id, skin_key) DO NOTHING
            "#,
        )
            .bind(user_id)
            .bind(default_skin)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let stats = self
            .get_stats(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user_stats for {user_id}")))?;
        let record = self
            .fetch_record(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sign_record for {user_id}")))?;
        Ok((stats, record))
    }

    async fn get_stats(&self, user_id: &str) -> Result<Option<UserStats>, Error> {
        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT user_id, points, favorability, skin_key
            FROM user_stats
            WHERE user_id = ?
            "#,
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stats)
    }

    async fn record_sign(&self, stats: &UserStats, record: &SignRecord) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE user_stats
            SET points = ?, favorability = ?, skin_key = ?
            WHERE user_id = ?
            "#,
        )
            .bind(stats.points)
            .bind(stats.favorability)
            .bind(&stats.skin_key)
            .bind(&stats.user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE sign_record
            SET last_sign_date = ?, continuous_days = ?, total_count = ?
            WHERE user_id = ?
            "#,
        )
            .bind(record.last_sign_date)
            .bind(record.continuous_days)
            .bind(record.total_count)
            .bind(&record.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn owns_skin(&self, user_id: &str, skin_key: &str) -> Result<bool, Error> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM user_skin WHERE user_id = ? AND skin_key = ?",
        )
            .bind(user_id)
            .bind(skin_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn add_skin(&self, user_id: &str, skin_key: &str) -> Result<bool, Error> {
        if self.get_stats(user_id).await?.is_none() {
            return Ok(false);
        }
        let result = sqlx::query(
            r#"
            INSERT INTO user_skin (user_id, skin_key)
            VALUES (?, ?)
            ON CONFLICT (user_id, skin_key) DO NOTHING
            "#,
        )
            .bind(user_id)
            .bind(skin_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_current_skin(&self, user_id: &str, skin_key: &str) -> Result<(), Error> {
        let result = sqlx::query("UPDATE user_stats SET skin_key = ? WHERE user_id = ?")
            .bind(skin_key)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user_stats for {user_id}")));
        }
        Ok(())
    }
}
