use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

/// One active refresh token of an account, tied to the device that opened
/// the session.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub token: String,
    pub device: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub struct RefreshTokenRepository {
    pool: Arc<DbPool>,
}

impl RefreshTokenRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Append a refresh record for an account, then evict the oldest records
    /// until at most `limit` remain (FIFO by creation time).
    pub async fn attach(
        &self,
        account_id: Uuid,
        token: &str,
        device: &str,
        expires_at: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<()> {
        let pool = self.pool.as_ref();
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, account_id, token, device, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(token)
        .bind(device)
        .bind(expires_at)
        .bind(now)
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE account_id = $1
              AND id NOT IN (
                SELECT id FROM refresh_tokens
                WHERE account_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
              )
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Find the non-expired record matching this token string
    pub async fn find_valid(
        &self,
        account_id: Uuid,
        token: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT * FROM refresh_tokens
            WHERE account_id = $1
              AND token = $2
              AND expires_at > NOW()
            "#,
        )
        .bind(account_id)
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Replace a consumed refresh token with its successor in a single
    /// conditional update keyed by the old token string.
    ///
    /// Device metadata is preserved because only the token and expiry
    /// columns change. Exactly one of any number of concurrent calls
    /// presenting the same old token can win; the rest see `false`.
    pub async fn rotate(
        &self,
        account_id: Uuid,
        old_token: &str,
        new_token: &str,
        new_expires_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET token = $1, expires_at = $2
            WHERE account_id = $3
              AND token = $4
              AND expires_at > NOW()
            "#,
        )
        .bind(new_token)
        .bind(new_expires_at)
        .bind(account_id)
        .bind(old_token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove the record matching this token string, if present
    pub async fn revoke(&self, account_id: Uuid, token: &str) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE account_id = $1 AND token = $2
            "#,
        )
        .bind(account_id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Count the active records of an account
    pub async fn count_for_account(&self, account_id: Uuid) -> AppResult<i64> {
        let pool = self.pool.as_ref();
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM refresh_tokens WHERE account_id = $1")
                .bind(account_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
