use crate::{
    error::{AppError, AppResult},
    infrastructure::repositories::{AccountRepository, RefreshTokenRepository},
};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::domain::account::PublicAccount;

use super::dto::{LoginRequest, RegisterRequest};
use super::TokenCodec;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

/// Freshly issued token pair plus the account it belongs to.
///
/// The refresh token and its expiry are carried separately from the client
/// payload because the controller moves them into the HTTP-only cookie.
#[derive(Debug)]
pub struct IssuedSession {
    pub user: PublicAccount,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

pub struct AuthService {
    account_repo: Arc<AccountRepository>,
    refresh_token_repo: Arc<RefreshTokenRepository>,
    codec: Arc<TokenCodec>,
    refresh_token_limit: i64,
}

impl AuthService {
    pub fn new(
        account_repo: Arc<AccountRepository>,
        refresh_token_repo: Arc<RefreshTokenRepository>,
        codec: Arc<TokenCodec>,
        refresh_token_limit: i64,
    ) -> Self {
        Self {
            account_repo,
            refresh_token_repo,
            codec,
            refresh_token_limit,
        }
    }

    /// Register a new account and open its first session
    pub async fn register(
        &self,
        request: RegisterRequest,
        device: &str,
    ) -> AppResult<IssuedSession> {
        if request.password != request.confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }
        if !email_regex().is_match(&request.email) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }

        // Email match is exact and case-sensitive, as stored
        if self
            .account_repo
            .find_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        let account = self
            .account_repo
            .create(
                request.name.as_str(),
                &request.email,
                &password_hash,
                request.image.as_deref(),
            )
            .await?;

        self.open_session(&account.id, PublicAccount::from(&account), device)
            .await
    }

    /// Log into an existing account, appending a refresh record for this device
    pub async fn login(&self, request: LoginRequest, device: &str) -> AppResult<IssuedSession> {
        let account = self
            .account_repo
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::BadCredentials("Email is not registered".to_string()))?;

        let matches = bcrypt::verify(&request.password, &account.password_hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))?;
        if !matches {
            return Err(AppError::BadCredentials("Password is incorrect".to_string()));
        }

        self.open_session(&account.id, PublicAccount::from(&account), device)
            .await
    }

    /// Exchange a refresh token for a fresh access/refresh pair.
    ///
    /// The stored record is replaced in place by a single conditional update
    /// keyed on the old token string, so a concurrently consumed token loses
    /// the race cleanly instead of being rotated twice.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<IssuedSession> {
        let claims = self.codec.verify_refresh(refresh_token)?;
        let account_id = claims.account_id()?;

        let account = self
            .account_repo
            .find_by_id(account_id)
            .await?
            .ok_or(AppError::InvalidRefreshToken)?;

        let new_refresh_token = self.codec.issue_refresh(account.id)?;
        let refresh_expires_at = self.codec.refresh_expires_at();

        let rotated = self
            .refresh_token_repo
            .rotate(account.id, refresh_token, &new_refresh_token, refresh_expires_at)
            .await?;
        if !rotated {
            return Err(AppError::InvalidRefreshToken);
        }

        let access_token = self.codec.issue_access(account.id)?;

        Ok(IssuedSession {
            user: PublicAccount::from(&account),
            access_token,
            refresh_token: new_refresh_token,
            access_expires_at: self.codec.access_expires_at(),
            refresh_expires_at,
        })
    }

    /// Revoke the refresh record matching `refresh_token`, if any.
    ///
    /// Logout must always succeed: decode failures, unknown accounts and
    /// store errors are all swallowed. Expiry is ignored when decoding so an
    /// expired token still gets its record cleaned up.
    pub async fn logout(&self, refresh_token: Option<&str>) {
        let Some(token) = refresh_token else {
            return;
        };

        let Ok(claims) = self.codec.decode_refresh_ignoring_expiry(token) else {
            return;
        };
        let Ok(account_id) = claims.account_id() else {
            return;
        };

        if let Err(e) = self.refresh_token_repo.revoke(account_id, token).await {
            tracing::warn!(error = %e, "Failed to revoke refresh token during logout");
        }
    }

    async fn open_session(
        &self,
        account_id: &Uuid,
        user: PublicAccount,
        device: &str,
    ) -> AppResult<IssuedSession> {
        let access_token = self.codec.issue_access(*account_id)?;
        let refresh_token = self.codec.issue_refresh(*account_id)?;
        let refresh_expires_at = self.codec.refresh_expires_at();

        self.refresh_token_repo
            .attach(
                *account_id,
                &refresh_token,
                device,
                refresh_expires_at,
                self.refresh_token_limit,
            )
            .await?;

        Ok(IssuedSession {
            user,
            access_token,
            refresh_token,
            access_expires_at: self.codec.access_expires_at(),
            refresh_expires_at,
        })
    }
}
