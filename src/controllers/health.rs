use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::db::{check_connection, DbPool};

/// Liveness: the process is up and serving
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness: the process can reach its database
pub async fn health_ready(State(pool): State<Arc<DbPool>>) -> impl IntoResponse {
    match check_connection(&pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "database": "connected",
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed to reach the database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "database": "disconnected",
                    "version": env!("CARGO_PKG_VERSION"),
                })),
            )
        }
    }
}
