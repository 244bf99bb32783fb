use axum::http::HeaderValue;
use axum::{middleware, routing::get, routing::post, routing::put, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domain::auth::TokenCodec;
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use crate::{
    controllers::{account::AccountController, auth::AuthController, health},
    infrastructure::auth::{auth_middleware, request_id_middleware},
};

use crate::infrastructure::repositories::AccountRepository;

/// Build the application router with all routes configured
pub fn build_router(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    account_repo: Arc<AccountRepository>,
    codec: Arc<TokenCodec>,
    auth_controller: Arc<AuthController>,
    account_controller: Arc<AccountController>,
) -> Router {
    // Auth routes (public - no auth required)
    let auth_routes = Router::new()
        .route("/auth/register", post(AuthController::register))
        .route("/auth/login", post(AuthController::login))
        .route("/auth/refresh-token", post(AuthController::refresh))
        .with_state(auth_controller.clone());

    // Logout needs an authenticated caller, even though the revocation
    // itself is keyed by the refresh token
    let logout_routes = Router::new()
        .route("/auth/logout", post(AuthController::logout))
        .with_state(auth_controller.clone())
        .layer(middleware::from_fn_with_state(
            (account_repo.clone(), codec.clone()),
            auth_middleware,
        ));

    // Account routes (require authentication)
    let account_routes = Router::new()
        .route("/auth/user", get(AccountController::get_user))
        .route(
            "/auth/user/profile",
            put(AccountController::update_profile),
        )
        .with_state(account_controller.clone())
        .layer(middleware::from_fn_with_state(
            (account_repo.clone(), codec.clone()),
            auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool.clone())
        .merge(auth_routes)
        .merge(logout_routes)
        .merge(account_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http());

    // Credentialed CORS needs a concrete origin, so the layer is opt-in
    if let Some(origin) = config.cors_allowed_origin.as_deref() {
        if let Ok(origin) = origin.parse::<HeaderValue>() {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods(tower_http::cors::AllowMethods::mirror_request())
                    .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
                    .allow_credentials(true),
            );
        }
    }

    app
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    account_repo: Arc<AccountRepository>,
    codec: Arc<TokenCodec>,
    auth_controller: Arc<AuthController>,
    account_controller: Arc<AccountController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(
        pool,
        config.clone(),
        account_repo,
        codec,
        auth_controller,
        account_controller,
    );

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
