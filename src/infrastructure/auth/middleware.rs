use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{
    domain::auth::TokenCodec, error::AppError, infrastructure::repositories::AccountRepository,
};
use uuid::Uuid;

/// Account context injected into request extensions after authentication
#[derive(Debug, Clone)]
pub struct AuthAccount {
    pub account_id: Uuid,
    pub email: String,
}

/// Authentication middleware: validates the bearer access token and loads
/// the account it names.
pub async fn auth_middleware(
    State((account_repo, codec)): State<(Arc<AccountRepository>, Arc<TokenCodec>)>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    // Check Bearer token format
    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Unauthorized(
            "Invalid authorization format".to_string(),
        ));
    }

    let token = &auth_header[7..]; // Skip "Bearer "

    // Access tokens are stateless: signature and expiry are the whole check
    let claims = codec.verify_access(token)?;
    let account_id = claims.account_id()?;

    // Verify the account still exists
    let account = account_repo
        .find_by_id(account_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    // Add account context to request
    request.extensions_mut().insert(AuthAccount {
        account_id: account.id,
        email: account.email,
    });

    Ok(next.run(request).await)
}
