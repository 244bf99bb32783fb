use crate::{
    error::{AppError, AppResult},
    infrastructure::repositories::AccountRepository,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{PublicAccount, UpdateProfileRequest};

pub struct AccountService {
    account_repo: Arc<AccountRepository>,
}

impl AccountService {
    pub fn new(account_repo: Arc<AccountRepository>) -> Self {
        Self { account_repo }
    }

    /// Get the public view of an account
    pub async fn get_profile(&self, account_id: Uuid) -> AppResult<PublicAccount> {
        let account = self
            .account_repo
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(PublicAccount::from(account))
    }

    /// Apply a partial profile update.
    ///
    /// Changing the email fails when another account already owns it; the
    /// current account keeping its own email is not a collision.
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        updates: UpdateProfileRequest,
    ) -> AppResult<PublicAccount> {
        let account = self
            .account_repo
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(new_email) = updates.email.as_deref() {
            if new_email != account.email {
                if let Some(other) = self.account_repo.find_by_email(new_email).await? {
                    if other.id != account.id {
                        return Err(AppError::Conflict("Email already exists".to_string()));
                    }
                }
            }
        }

        let updated = self
            .account_repo
            .update_profile(account_id, updates.name, updates.email, updates.image)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(PublicAccount::from(updated))
    }
}
