use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Account ID
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub jti: String, // Unique token id; keeps same-second issues distinct
}

impl Claims {
    pub fn account_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::TokenInvalid)
    }
}

/// Issues and verifies the two signed token kinds of the auth lifecycle.
///
/// Access tokens are short-lived and stateless; refresh tokens are long-lived
/// and only valid while a matching record exists in the refresh-token store.
/// The two kinds are signed with distinct secrets so one can never be
/// presented in place of the other.
pub struct TokenCodec {
    access_secret: String,
    refresh_secret: String,
    access_expiry_minutes: i64,
    refresh_expiry_days: i64,
}

impl TokenCodec {
    pub fn new(
        access_secret: String,
        refresh_secret: String,
        access_expiry_minutes: i64,
        refresh_expiry_days: i64,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_expiry_minutes,
            refresh_expiry_days,
        }
    }

    /// Generate a signed access token for an account
    pub fn issue_access(&self, account_id: Uuid) -> AppResult<String> {
        self.issue(
            account_id,
            &self.access_secret,
            Duration::minutes(self.access_expiry_minutes),
        )
    }

    /// Generate a signed refresh token for an account
    pub fn issue_refresh(&self, account_id: Uuid) -> AppResult<String> {
        self.issue(
            account_id,
            &self.refresh_secret,
            Duration::days(self.refresh_expiry_days),
        )
    }

    fn issue(&self, account_id: Uuid, secret: &str, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate an access token and extract its claims
    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        Self::verify(token, &self.access_secret)
    }

    /// Validate a refresh token and extract its claims
    pub fn verify_refresh(&self, token: &str) -> AppResult<Claims> {
        Self::verify(token, &self.refresh_secret)
    }

    fn verify(token: &str, secret: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::TokenInvalid,
        })
    }

    /// Decode a refresh token without checking expiry.
    ///
    /// Only used by logout, which still wants the subject of an expired
    /// token so the matching record can be cleaned up.
    pub fn decode_refresh_ignoring_expiry(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = false;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::TokenInvalid)
    }

    /// Wall-clock instant at which an access token issued now expires
    pub fn access_expires_at(&self) -> DateTime<Utc> {
        Utc::now() + Duration::minutes(self.access_expiry_minutes)
    }

    /// Wall-clock instant at which a refresh token issued now expires
    pub fn refresh_expires_at(&self) -> DateTime<Utc> {
        Utc::now() + Duration::days(self.refresh_expiry_days)
    }

    pub fn refresh_expiry_days(&self) -> i64 {
        self.refresh_expiry_days
    }
}
