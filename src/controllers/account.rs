use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    domain::account::{AccountService, PublicAccount, UpdateProfileRequest},
    domain::shared::ApiEnvelope,
    error::AppResult,
    infrastructure::auth::AuthAccount,
};

pub struct AccountController {
    account_service: Arc<AccountService>,
}

impl AccountController {
    pub fn new(account_service: Arc<AccountService>) -> Self {
        Self { account_service }
    }

    /// GET /auth/user - Current account's public view
    pub async fn get_user(
        State(controller): State<Arc<AccountController>>,
        Extension(auth): Extension<AuthAccount>,
    ) -> AppResult<Json<ApiEnvelope<PublicAccount>>> {
        let profile = controller
            .account_service
            .get_profile(auth.account_id)
            .await?;
        Ok(Json(ApiEnvelope::success(profile)))
    }

    /// PUT /auth/user/profile - Partial profile update
    pub async fn update_profile(
        State(controller): State<Arc<AccountController>>,
        Extension(auth): Extension<AuthAccount>,
        Json(request): Json<UpdateProfileRequest>,
    ) -> AppResult<Json<ApiEnvelope<PublicAccount>>> {
        let profile = controller
            .account_service
            .update_profile(auth.account_id, request)
            .await?;
        Ok(Json(ApiEnvelope::success(profile)))
    }
}
