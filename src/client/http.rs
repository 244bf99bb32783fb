use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::account::{PublicAccount, UpdateProfileRequest};
use crate::domain::auth::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::domain::shared::ApiEnvelope;

use super::session::SessionStore;
use super::tokens::TokenCache;

const REFRESH_PATH: &str = "/auth/refresh-token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a failure envelope
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Refresh failed; the session has been torn down
    #[error("session expired")]
    SessionExpired,

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// HTTP client that keeps its requests authenticated.
///
/// Outgoing requests carry the cached access token as a bearer header. A 401
/// response triggers one refresh followed by one retry; refreshes are
/// single-flight, so any number of concurrently failing requests produce at
/// most one call to the refresh endpoint. The refresh token itself travels
/// in the HTTP-only cookie held by the cookie jar and is never visible here.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenCache,
    session: Arc<SessionStore>,
    /// Serializes refresh attempts. Waiters re-check the generation after
    /// acquiring the lock instead of refreshing again themselves.
    refresh_lock: tokio::sync::Mutex<()>,
    refresh_generation: AtomicU64,
    on_session_expired: Option<Hook>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            tokens: TokenCache::new(),
            session,
            refresh_lock: tokio::sync::Mutex::new(()),
            refresh_generation: AtomicU64::new(0),
            on_session_expired: None,
        })
    }

    /// Install the hook invoked when the session cannot be recovered
    /// (the navigate-to-login seam).
    pub fn on_session_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Box::new(hook));
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens.get()
    }

    /// Replace the cached access token (restoring a persisted one, or
    /// priming tests with a stale credential)
    pub fn set_access_token(&self, token: impl Into<String>) {
        self.tokens.set(token);
    }

    /// Number of completed refreshes; observable proof of single-flight
    pub fn refresh_count(&self) -> u64 {
        self.refresh_generation.load(Ordering::Acquire)
    }

    // === High-level auth operations ===

    /// Restore a persisted session and validate it against the server.
    /// Always leaves the store initialized, authenticated or not.
    pub async fn initialize(&self) {
        self.session.rehydrate().await;
        if self.tokens.get().is_some() && self.fetch_profile().await.is_err() {
            self.session.set_user(None).await;
        }
        self.session.initialize();
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .request(Method::POST, "/auth/register", Some(request))
            .await?;
        self.tokens.set(&auth.access_token);
        self.session.login(auth.user.clone()).await;
        Ok(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicAccount, ClientError> {
        self.session.set_loading(true);
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        match self
            .request::<_, AuthResponse>(Method::POST, "/auth/login", Some(&body))
            .await
        {
            Ok(auth) => {
                self.tokens.set(&auth.access_token);
                self.session.login(auth.user.clone()).await;
                Ok(auth.user)
            }
            Err(e) => {
                // Login failures surface the server's message to the UI
                self.session.set_error(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Logout never fails from the caller's point of view; local state is
    /// torn down even when the server is unreachable.
    pub async fn logout(&self) {
        if let Err(e) = self
            .request::<(), Option<AuthResponse>>(Method::POST, "/auth/logout", None)
            .await
        {
            tracing::warn!(error = %e, "Logout request failed; clearing local session anyway");
        }
        self.tokens.clear();
        self.session.logout().await;
    }

    pub async fn fetch_profile(&self) -> Result<PublicAccount, ClientError> {
        let profile: PublicAccount = self.request::<(), _>(Method::GET, "/auth/user", None).await?;
        self.session.set_user(Some(profile.clone())).await;
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<PublicAccount, ClientError> {
        let profile: PublicAccount = self
            .request(Method::PUT, "/auth/user/profile", Some(request))
            .await?;
        self.session.set_user(Some(profile.clone())).await;
        Ok(profile)
    }

    // === Request pipeline ===

    /// Send a request, transparently recovering from access-token expiry.
    /// A request is retried at most once, and never for the refresh
    /// endpoint itself.
    pub async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        // Generation observed before sending; a 401 only warrants a refresh
        // if nobody else refreshed after this request left
        let seen = self.refresh_generation.load(Ordering::Acquire);
        let response = self.send_once(method.clone(), path, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED && path != REFRESH_PATH {
            self.refresh_access_token(seen).await?;
            let retried = self.send_once(method, path, body).await?;
            return self.decode(path, retried).await;
        }

        self.decode(path, response).await
    }

    async fn send_once<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));

        if let Some(token) = self.tokens.get() {
            if token.trim().is_empty() {
                // A blank token is corrupt state, not a credential
                self.tokens.clear();
            } else {
                builder = builder.bearer_auth(token);
            }
        }

        if let Some(body) = body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        match status {
            StatusCode::FORBIDDEN => {
                tracing::error!(path, "Access forbidden - insufficient permissions")
            }
            StatusCode::NOT_FOUND => tracing::error!(path, "Resource not found"),
            StatusCode::UNPROCESSABLE_ENTITY => tracing::error!(path, "Validation error"),
            s if s.is_server_error() => {
                tracing::error!(path, status = s.as_u16(), "Server error occurred")
            }
            _ => {}
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        envelope
            .into_result()
            .map_err(|(message, status)| ClientError::Api { status, message })
    }

    /// Single-flight token refresh.
    ///
    /// `seen` is the generation the caller observed before its request
    /// failed. The first caller through the lock performs the refresh and
    /// bumps the generation; callers whose failure predates a completed
    /// refresh return immediately and reuse the token the winner cached.
    /// On failure the local session is invalidated and the expiry hook
    /// fires.
    pub async fn refresh_access_token(&self, seen: u64) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;

        if self.refresh_generation.load(Ordering::Acquire) != seen {
            return Ok(());
        }

        match self.perform_refresh().await {
            Ok(auth) => {
                self.tokens.set(&auth.access_token);
                self.session.set_user(Some(auth.user)).await;
                self.refresh_generation.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Token refresh failed");
                self.tokens.clear();
                self.session.reset().await;
                if let Some(hook) = &self.on_session_expired {
                    hook();
                }
                Err(ClientError::SessionExpired)
            }
        }
    }

    async fn perform_refresh(&self) -> Result<AuthResponse, ClientError> {
        // No bearer header: the cookie jar carries the refresh token
        let response = self
            .http
            .post(format!("{}{}", self.base_url, REFRESH_PATH))
            .send()
            .await?;

        let envelope: ApiEnvelope<AuthResponse> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        envelope
            .into_result()
            .map_err(|(message, status)| ClientError::Api { status, message })
    }
}
