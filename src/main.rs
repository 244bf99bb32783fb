use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verdant_backend::domain::account::AccountService;
use verdant_backend::domain::auth::{AuthService, TokenCodec};
use verdant_backend::infrastructure::config::{Config, LogFormat};
use verdant_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use verdant_backend::infrastructure::http::start_http_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Verdant Backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection and apply migrations
    check_connection(&pool).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database connection verified, migrations applied");

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject db pool)
    let account_repo = Arc::new(
        verdant_backend::infrastructure::repositories::AccountRepository::new(pool.clone()),
    );
    let refresh_token_repo = Arc::new(
        verdant_backend::infrastructure::repositories::RefreshTokenRepository::new(pool.clone()),
    );

    // 2. Instantiate the token codec
    let codec = Arc::new(TokenCodec::new(
        config.jwt_access_secret.clone(),
        config.jwt_refresh_secret.clone(),
        config.access_token_expiry_minutes,
        config.refresh_token_expiry_days,
    ));

    // 3. Instantiate services (inject repositories and codec)
    let auth_service = Arc::new(AuthService::new(
        account_repo.clone(),
        refresh_token_repo.clone(),
        codec.clone(),
        config.refresh_token_limit,
    ));
    let account_service = Arc::new(AccountService::new(account_repo.clone()));

    // 4. Instantiate controllers (inject services)
    let auth_controller = Arc::new(verdant_backend::controllers::auth::AuthController::new(
        auth_service,
        config.clone(),
    ));
    let account_controller = Arc::new(
        verdant_backend::controllers::account::AccountController::new(account_service),
    );

    // Start HTTP server with all routes
    start_http_server(
        pool,
        config,
        account_repo,
        codec,
        auth_controller,
        account_controller,
    )
    .await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "verdant_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "verdant_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
