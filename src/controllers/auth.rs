use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::{
    domain::auth::{
        dto::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest},
        service::IssuedSession,
        AuthService,
    },
    domain::shared::ApiEnvelope,
    error::{AppError, AppResult},
    infrastructure::config::Config,
};

pub const REFRESH_COOKIE: &str = "refreshToken";

pub struct AuthController {
    auth_service: Arc<AuthService>,
    config: Arc<Config>,
}

impl AuthController {
    pub fn new(auth_service: Arc<AuthService>, config: Arc<Config>) -> Self {
        Self {
            auth_service,
            config,
        }
    }

    /// POST /auth/register - Create an account and open its first session
    pub async fn register(
        State(controller): State<Arc<AuthController>>,
        jar: CookieJar,
        headers: HeaderMap,
        Json(request): Json<RegisterRequest>,
    ) -> AppResult<(CookieJar, Json<ApiEnvelope<AuthResponse>>)> {
        let device = device_from(&headers);
        let session = controller.auth_service.register(request, &device).await?;

        let jar = jar.add(controller.refresh_cookie(&session.refresh_token));
        Ok((
            jar,
            Json(ApiEnvelope::success(to_response(session, false))),
        ))
    }

    /// POST /auth/login - Authenticate and append a session for this device
    pub async fn login(
        State(controller): State<Arc<AuthController>>,
        jar: CookieJar,
        headers: HeaderMap,
        Json(request): Json<LoginRequest>,
    ) -> AppResult<(CookieJar, Json<ApiEnvelope<AuthResponse>>)> {
        let device = device_from(&headers);
        let session = controller.auth_service.login(request, &device).await?;

        let jar = jar.add(controller.refresh_cookie(&session.refresh_token));
        // Login still echoes the refresh token in the body for cookie-less clients
        Ok((jar, Json(ApiEnvelope::success(to_response(session, true)))))
    }

    /// POST /auth/refresh-token - Rotate the refresh token, issue a new access token
    pub async fn refresh(
        State(controller): State<Arc<AuthController>>,
        jar: CookieJar,
        body: Option<Json<RefreshTokenRequest>>,
    ) -> AppResult<(CookieJar, Json<ApiEnvelope<AuthResponse>>)> {
        let refresh_token = token_from(&jar, body.as_ref().map(|Json(b)| b))
            .ok_or(AppError::RefreshTokenRequired)?;

        let session = controller.auth_service.refresh(&refresh_token).await?;

        let jar = jar.add(controller.refresh_cookie(&session.refresh_token));
        Ok((
            jar,
            Json(ApiEnvelope::success(to_response(session, false))),
        ))
    }

    /// POST /auth/logout - Revoke the session; always succeeds
    pub async fn logout(
        State(controller): State<Arc<AuthController>>,
        jar: CookieJar,
        body: Option<Json<RefreshTokenRequest>>,
    ) -> (CookieJar, Json<ApiEnvelope<Option<AuthResponse>>>) {
        let refresh_token = token_from(&jar, body.as_ref().map(|Json(b)| b));

        controller
            .auth_service
            .logout(refresh_token.as_deref())
            .await;

        // The cookie is cleared whether or not a token was presented
        let jar = jar.remove(Cookie::build((REFRESH_COOKIE, "")).path("/").build());
        (jar, Json(ApiEnvelope::success(None)))
    }

    fn refresh_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((REFRESH_COOKIE, token.to_string()))
            .http_only(true)
            .secure(self.config.is_production())
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(time::Duration::days(self.config.refresh_token_expiry_days))
            .build()
    }
}

fn device_from(headers: &HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Body token wins over the cookie, matching the documented fallback order
fn token_from(jar: &CookieJar, body: Option<&RefreshTokenRequest>) -> Option<String> {
    body.and_then(|b| b.refresh_token.clone())
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
}

fn to_response(session: IssuedSession, include_refresh: bool) -> AuthResponse {
    AuthResponse {
        user: session.user,
        access_token: session.access_token,
        refresh_token: include_refresh.then_some(session.refresh_token),
        expires_at: session.access_expires_at,
    }
}
