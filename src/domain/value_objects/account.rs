use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::profiles::ProfileEntity;

use super::{enums::roles::Role, subscriptions::SubscriptionDto};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileDto {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileEntity> for ProfileDto {
    fn from(value: ProfileEntity) -> Self {
        Self {
            id: value.id,
            email: value.email,
            full_name: value.full_name,
            avatar_url: value.avatar_url,
            role: Role::from_str(&value.role),
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountDto {
    pub profile: Option<ProfileDto>,
    pub subscription: Option<SubscriptionDto>,
    pub has_active_subscription: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccountModel {
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileDto,
}
