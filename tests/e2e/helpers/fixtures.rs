use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use verdant_backend::domain::account::Account;
use verdant_backend::infrastructure::repositories::{
    RefreshTokenRecord, RefreshTokenRepository,
};

// Low bcrypt cost keeps fixture creation fast; never use outside tests
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestFixtures {
    pool: PgPool,
    refresh_tokens: RefreshTokenRepository,
}

impl TestFixtures {
    pub fn new(pool: PgPool) -> Self {
        let refresh_tokens = RefreshTokenRepository::new(Arc::new(pool.clone()));
        Self {
            pool,
            refresh_tokens,
        }
    }

    pub async fn create_account(&self, email: &str, password: &str) -> Result<Account> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: Some("Test Grower".to_string()),
            email: email.to_string(),
            password_hash: bcrypt::hash(password, TEST_BCRYPT_COST)?,
            profile_image: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, profile_image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.profile_image)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn create_refresh_record(
        &self,
        account_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, account_id, token, device, expires_at, created_at)
            VALUES ($1, $2, $3, 'test-device', $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(token)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn refresh_token_count(&self, account_id: Uuid) -> Result<i64> {
        Ok(self.refresh_tokens.count_for_account(account_id).await?)
    }

    pub async fn find_valid_refresh_record(
        &self,
        account_id: Uuid,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>> {
        Ok(self.refresh_tokens.find_valid(account_id, token).await?)
    }

    pub async fn refresh_tokens_for(&self, account_id: Uuid) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT token FROM refresh_tokens WHERE account_id = $1 ORDER BY created_at ASC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(token,)| token).collect())
    }
}
