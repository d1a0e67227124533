use anyhow::Result;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use reqwest::{Method, RequestBuilder, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{error, warn};

use crate::domain::{
    repositories::auth_provider::{AuthProvider, ProviderRejection},
    value_objects::auth::{AuthIdentity, AuthSession, PkceStart, SignUpOutcome},
};

const CODE_CHALLENGE_METHOD: &str = "s256";

/// Supabase Auth (GoTrue) REST client.
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    auth_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct GoTrueErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Signup answers with a session when email confirmation is off, otherwise with the bare user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResp {
    Session(AuthSession),
    User(AuthIdentity),
}

/// Verifier and S256 challenge for one PKCE round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

impl SupabaseAuthClient {
    pub fn new(project_url: &str, anon_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: format!("{}/auth/v1", project_url.trim_end_matches('/')),
            anon_key,
        }
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.auth_url, path))
            .header("apikey", &self.anon_key)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", bearer.unwrap_or(&self.anon_key)),
            )
    }

    /// 4xx answers become `ProviderRejection` so the caller can show the provider's message.
    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoTrueErrorBody>(&body)
            .ok()
            .and_then(GoTrueErrorBody::into_message);

        if status.is_client_error() {
            warn!(status = %status, context = %context, message = ?message, "supabase auth rejected request");
            return Err(ProviderRejection::new(
                message.unwrap_or_else(|| format!("{} failed", context)),
            ));
        }

        error!(
            status = %status,
            context = %context,
            response_body = %body,
            "supabase auth request failed"
        );
        anyhow::bail!("Supabase Auth request failed: {} (status {})", context, status);
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str, challenge: &str) -> Result<String> {
        let url = url::Url::parse_with_params(
            &format!("{}/authorize", self.auth_url),
            &[
                ("provider", provider),
                ("redirect_to", redirect_to),
                ("code_challenge", challenge),
                ("code_challenge_method", CODE_CHALLENGE_METHOD),
            ],
        )?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
        redirect_to: &str,
    ) -> Result<SignUpOutcome> {
        let resp = self
            .request(Method::POST, "/signup", None)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "sign up").await?;

        let outcome = match resp.json::<SignUpResp>().await? {
            SignUpResp::Session(session) => SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            },
            SignUpResp::User(user) => SignUpOutcome {
                user,
                session: None,
            },
        };
        Ok(outcome)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let resp = self
            .request(Method::POST, "/token", None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "password sign in").await?;

        Ok(resp.json::<AuthSession>().await?)
    }

    async fn start_magic_link(&self, email: &str, redirect_to: &str) -> Result<PkceStart> {
        let pkce = PkcePair::generate();
        let resp = self
            .request(Method::POST, "/otp", None)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({
                "email": email,
                "create_user": true,
                "code_challenge": pkce.challenge,
                "code_challenge_method": CODE_CHALLENGE_METHOD,
            }))
            .send()
            .await?;
        Self::ensure_success(resp, "magic link").await?;

        Ok(PkceStart {
            url: None,
            code_verifier: pkce.verifier,
        })
    }

    fn start_oauth(&self, provider: &str, redirect_to: &str) -> Result<PkceStart> {
        let pkce = PkcePair::generate();
        let url = self.authorize_url(provider, redirect_to, &pkce.challenge)?;

        Ok(PkceStart {
            url: Some(url),
            code_verifier: pkce.verifier,
        })
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<AuthSession> {
        let resp = self
            .request(Method::POST, "/token", None)
            .query(&[("grant_type", "pkce")])
            .json(&json!({ "auth_code": code, "code_verifier": code_verifier }))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "code exchange").await?;

        Ok(resp.json::<AuthSession>().await?)
    }

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<()> {
        let resp = self
            .request(Method::POST, "/recover", None)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await?;
        Self::ensure_success(resp, "password reset").await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<()> {
        let resp = self
            .request(Method::PUT, "/user", Some(access_token))
            .json(&json!({ "password": password }))
            .send()
            .await?;
        Self::ensure_success(resp, "update password").await?;
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let resp = self
            .request(Method::POST, "/logout", Some(access_token))
            .send()
            .await?;
        Self::ensure_success(resp, "sign out").await?;
        Ok(())
    }
}
