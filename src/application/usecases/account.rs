use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::{
    repositories::{profiles::ProfileRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        account::{AccountDto, ProfileDto, UpdateAccountModel},
        auth::SessionUser,
        subscriptions::{SubscriptionDto, is_subscription_active},
    },
};

const MAX_FULL_NAME_LENGTH: usize = 120;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Profile not found")]
    ProfileNotFound,
    #[error("Full name must be at most 120 characters")]
    NameTooLong,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::ProfileNotFound => StatusCode::NOT_FOUND,
            AccountError::NameTooLong => StatusCode::BAD_REQUEST,
            AccountError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AccountError>;

pub struct AccountUseCase<P, S>
where
    P: ProfileRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    profile_repo: Arc<P>,
    subscription_repo: Arc<S>,
}

impl<P, S> AccountUseCase<P, S>
where
    P: ProfileRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(profile_repo: Arc<P>, subscription_repo: Arc<S>) -> Self {
        Self {
            profile_repo,
            subscription_repo,
        }
    }

    pub async fn get_account(&self, session: &SessionUser) -> UseCaseResult<AccountDto> {
        let user_id = session.user_id;
        info!(%user_id, "account: loading account");

        let profile = self.profile_repo.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "account: failed to load profile");
            AccountError::Internal(err)
        })?;
        let subscription = self
            .subscription_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "account: failed to load subscription");
                AccountError::Internal(err)
            })?;

        let has_active_subscription = subscription
            .as_ref()
            .map(|subscription| is_subscription_active(subscription, Utc::now()))
            .unwrap_or(false);

        Ok(AccountDto {
            profile: profile.map(ProfileDto::from),
            subscription: subscription.map(SubscriptionDto::from),
            has_active_subscription,
            is_admin: session.role.is_admin(),
        })
    }

    /// Blank names clear the stored value.
    pub async fn update_account(
        &self,
        session: &SessionUser,
        model: UpdateAccountModel,
    ) -> UseCaseResult<ProfileDto> {
        let user_id = session.user_id;
        let full_name = model
            .full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        if full_name
            .as_ref()
            .is_some_and(|name| name.chars().count() > MAX_FULL_NAME_LENGTH)
        {
            return Err(AccountError::NameTooLong);
        }

        let profile = self
            .profile_repo
            .update_full_name(user_id, full_name)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "account: failed to update profile");
                AccountError::Internal(err)
            })?
            .ok_or(AccountError::ProfileNotFound)?;

        info!(%user_id, "account: profile updated");
        Ok(ProfileDto::from(profile))
    }
}
