use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::roles::Role;

/// Identity resolved from a verified session token plus the stored profile role.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpModel {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

/// One body shape for the three sign-in flows; the use case picks the flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInModel {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordModel {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePasswordModel {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    pub ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthIdentity {
    /// Display name from the identity metadata (`full_name`, else the OAuth `name`).
    pub fn metadata_full_name(&self) -> Option<String> {
        ["full_name", "name"].iter().find_map(|key| {
            self.user_metadata
                .get(*key)
                .and_then(|value| value.as_str())
                .filter(|value| !value.trim().is_empty())
                .map(|value| value.to_string())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: AuthIdentity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: AuthIdentity,
    pub session: Option<AuthSession>,
}

/// Provider redirect plus the PKCE verifier the callback needs to finish the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct PkceStart {
    pub url: Option<String>,
    pub code_verifier: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpUserDto {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub message: String,
    pub user: SignUpUserDto,
}

#[derive(Debug, Serialize)]
pub struct SignedInUserDto {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub user: SignedInUserDto,
    #[serde(rename = "redirectTo")]
    pub redirect_to: String,
}

#[derive(Debug, Serialize)]
pub struct OAuthUrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub next: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
