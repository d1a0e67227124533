use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::auth::{AuthSession, PkceStart, SignUpOutcome};

/// The identity provider refused the request (bad credentials, duplicate user, weak password).
/// Carried inside `anyhow::Error` so callers can tell it apart from transport failures.
#[derive(Debug)]
pub struct ProviderRejection {
    pub message: String,
}

impl ProviderRejection {
    pub fn new(message: impl Into<String>) -> anyhow::Error {
        anyhow::Error::new(Self {
            message: message.into(),
        })
    }
}

impl fmt::Display for ProviderRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderRejection {}

#[automock]
#[async_trait]
pub trait AuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
        redirect_to: &str,
    ) -> Result<SignUpOutcome>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn start_magic_link(&self, email: &str, redirect_to: &str) -> Result<PkceStart>;

    fn start_oauth(&self, provider: &str, redirect_to: &str) -> Result<PkceStart>;

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<AuthSession>;

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<()>;

    async fn update_password(&self, access_token: &str, password: &str) -> Result<()>;

    async fn sign_out(&self, access_token: &str) -> Result<()>;
}
