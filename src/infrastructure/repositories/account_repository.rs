use crate::domain::account::Account;
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct AccountRepository {
    pool: Arc<DbPool>,
}

impl AccountRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Find account by ID
    pub async fn find_by_id(&self, account_id: Uuid) -> AppResult<Option<Account>> {
        let pool = self.pool.as_ref();
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(pool)
            .await?;

        Ok(account)
    }

    /// Find account by email (exact, case-sensitive match)
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let pool = self.pool.as_ref();
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(account)
    }

    /// Create a new account
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        profile_image: Option<&str>,
    ) -> AppResult<Account> {
        let pool = self.pool.as_ref();
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, profile_image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(profile_image)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(account)
    }

    /// Apply a partial profile update; omitted fields are left untouched
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        name: Option<String>,
        email: Option<String>,
        profile_image: Option<String>,
    ) -> AppResult<Option<Account>> {
        let pool = self.pool.as_ref();
        let now = chrono::Utc::now();

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                profile_image = COALESCE($3, profile_image),
                updated_at = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(profile_image)
        .bind(now)
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }
}
