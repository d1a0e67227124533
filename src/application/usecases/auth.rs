use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::{auth_events::InsertAuthEventEntity, profiles::InsertProfileEntity},
    repositories::{
        auth_events::AuthEventRepository,
        auth_provider::{AuthProvider, ProviderRejection},
        profiles::ProfileRepository,
    },
    value_objects::{
        auth::{
            AuthIdentity, AuthSession, CallbackParams, RequestMeta, ResetPasswordModel,
            SignInModel, SignUpModel, SignUpResponse, SignUpUserDto, UpdatePasswordModel,
        },
        enums::auth_event_kinds::AuthEventKind,
    },
};

pub const DEFAULT_NEXT_PATH: &str = "/videos";
pub const MIN_PASSWORD_LENGTH: usize = 6;
const SUPPORTED_OAUTH_PROVIDERS: [&str; 1] = ["google"];
const CALLBACK_FAILED_MESSAGE: &str = "Failed to authenticate. Please try again.";
const SAME_SITE_BASE: &str = "http://same-site.invalid";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::Rejected(_) => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Provider refusals surface their message; anything else stays internal.
    fn from_provider(err: anyhow::Error) -> Self {
        match err.downcast_ref::<ProviderRejection>() {
            Some(rejection) => AuthError::Rejected(rejection.message.clone()),
            None => AuthError::Internal(err),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SignInOutcome {
    OAuth {
        url: String,
        code_verifier: String,
    },
    MagicLink {
        message: String,
        code_verifier: String,
    },
    Password {
        session: AuthSession,
        redirect_to: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOutcome {
    pub location: String,
    pub session: Option<AuthSession>,
}

pub struct AuthUseCase<A, P, E>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    auth_provider: Arc<A>,
    profile_repo: Arc<P>,
    auth_event_repo: Arc<E>,
    site_url: String,
}

impl<A, P, E> AuthUseCase<A, P, E>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    pub fn new(
        auth_provider: Arc<A>,
        profile_repo: Arc<P>,
        auth_event_repo: Arc<E>,
        site_url: String,
    ) -> Self {
        Self {
            auth_provider,
            profile_repo,
            auth_event_repo,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn sign_up(&self, model: SignUpModel) -> UseCaseResult<SignUpResponse> {
        let email = validate_email(model.email.as_deref())?;
        let password = validate_password(model.password.as_deref())?;
        let full_name = model
            .full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        info!(%email, "auth: signing up");
        let redirect_to = format!("{}/auth/callback", self.site_url);
        let outcome = self
            .auth_provider
            .sign_up(&email, &password, full_name.clone(), &redirect_to)
            .await
            .map_err(|err| {
                warn!(%email, error = %err, "auth: sign-up refused");
                AuthError::from_provider(err)
            })?;

        self.ensure_profile(&outcome.user, &email, full_name).await;

        let email_confirmed = outcome.user.email_confirmed_at.is_some();
        let message = if email_confirmed {
            "Account created successfully"
        } else {
            "Please check your email to confirm your account"
        };
        info!(user_id = %outcome.user.id, email_confirmed, "auth: account created");

        Ok(SignUpResponse {
            message: message.to_string(),
            user: SignUpUserDto {
                id: outcome.user.id,
                email: outcome.user.email,
                email_confirmed,
            },
        })
    }

    /// Picks the flow from the body: `provider` wins, then `type: magic_link`, then password.
    pub async fn sign_in(
        &self,
        model: SignInModel,
        next: Option<&str>,
        meta: RequestMeta,
    ) -> UseCaseResult<SignInOutcome> {
        let next = sanitize_next(next);

        if let Some(provider) = model.provider.as_deref() {
            return self.start_oauth(provider, &next);
        }

        if model.type_.as_deref() == Some("magic_link") {
            let email = validate_email(model.email.as_deref())?;
            info!(%email, "auth: sending magic link");
            let start = self
                .auth_provider
                .start_magic_link(&email, &self.callback_url(&next))
                .await
                .map_err(|err| {
                    warn!(%email, error = %err, "auth: magic link refused");
                    AuthError::from_provider(err)
                })?;
            return Ok(SignInOutcome::MagicLink {
                message: "Check your email for the magic link".to_string(),
                code_verifier: start.code_verifier,
            });
        }

        let email = validate_email(model.email.as_deref())?;
        let password = validate_password(model.password.as_deref())?;
        let session = self
            .auth_provider
            .sign_in_with_password(&email, &password)
            .await
            .map_err(|err| {
                warn!(%email, error = %err, "auth: password sign-in refused");
                AuthError::from_provider(err)
            })?;

        self.ensure_profile(&session.user, &email, None).await;
        self.record_event(session.user.id, AuthEventKind::SignIn, meta)
            .await;
        info!(user_id = %session.user.id, "auth: signed in with password");

        Ok(SignInOutcome::Password {
            session,
            redirect_to: next,
        })
    }

    fn start_oauth(&self, provider: &str, next: &str) -> UseCaseResult<SignInOutcome> {
        if !SUPPORTED_OAUTH_PROVIDERS.contains(&provider) {
            return Err(AuthError::Validation(format!(
                "Unsupported sign-in provider: {}",
                provider
            )));
        }

        let start = self
            .auth_provider
            .start_oauth(provider, &self.callback_url(next))
            .map_err(AuthError::from_provider)?;
        let url = start.url.ok_or_else(|| {
            error!(provider, "auth: provider returned no authorize url");
            AuthError::Internal(anyhow::anyhow!("missing OAuth authorize url"))
        })?;

        info!(provider, "auth: oauth flow started");
        Ok(SignInOutcome::OAuth {
            url,
            code_verifier: start.code_verifier,
        })
    }

    /// The provider call is best effort: a stale token still ends with cleared cookies.
    pub async fn sign_out(
        &self,
        access_token: Option<&str>,
        user_id: Option<Uuid>,
        meta: RequestMeta,
    ) -> UseCaseResult<()> {
        if let Some(access_token) = access_token {
            if let Err(err) = self.auth_provider.sign_out(access_token).await {
                warn!(error = %err, "auth: provider sign-out failed, clearing session anyway");
            }
        }

        if let Some(user_id) = user_id {
            self.record_event(user_id, AuthEventKind::SignOut, meta)
                .await;
            info!(%user_id, "auth: signed out");
        }

        Ok(())
    }

    pub async fn handle_callback(
        &self,
        params: CallbackParams,
        code_verifier: Option<&str>,
    ) -> CallbackOutcome {
        if let Some(error) = params.error.as_deref() {
            let description = params.error_description.as_deref().unwrap_or(error);
            warn!(error, description, "auth: callback received provider error");
            return CallbackOutcome {
                location: sign_in_error_location(description),
                session: None,
            };
        }

        let Some(code) = params.code.as_deref() else {
            return CallbackOutcome {
                location: "/signin".to_string(),
                session: None,
            };
        };

        let Some(code_verifier) = code_verifier else {
            warn!("auth: callback without code verifier");
            return CallbackOutcome {
                location: sign_in_error_location(CALLBACK_FAILED_MESSAGE),
                session: None,
            };
        };

        let session = match self.auth_provider.exchange_code(code, code_verifier).await {
            Ok(session) => session,
            Err(err) => {
                error!(error = %err, "auth: code exchange failed");
                return CallbackOutcome {
                    location: sign_in_error_location(CALLBACK_FAILED_MESSAGE),
                    session: None,
                };
            }
        };

        let email = session.user.email.clone().unwrap_or_default();
        let full_name = session.user.metadata_full_name();
        self.ensure_profile(&session.user, &email, full_name).await;
        info!(user_id = %session.user.id, "auth: callback exchanged code for session");

        CallbackOutcome {
            location: sanitize_next(params.next.as_deref()),
            session: Some(session),
        }
    }

    pub async fn request_password_reset(&self, model: ResetPasswordModel) -> UseCaseResult<()> {
        let email = validate_email(model.email.as_deref())?;
        let redirect_to = format!("{}/auth/reset-password?type=recovery", self.site_url);

        self.auth_provider
            .send_password_reset(&email, &redirect_to)
            .await
            .map_err(|err| {
                warn!(%email, error = %err, "auth: password reset refused");
                AuthError::from_provider(err)
            })?;

        info!(%email, "auth: password reset email requested");
        Ok(())
    }

    pub async fn update_password(
        &self,
        user_id: Uuid,
        access_token: &str,
        model: UpdatePasswordModel,
    ) -> UseCaseResult<()> {
        if model.password != model.confirm_password {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }
        let password = validate_password(Some(&model.password))?;

        self.auth_provider
            .update_password(access_token, &password)
            .await
            .map_err(|err| {
                warn!(%user_id, error = %err, "auth: password update refused");
                AuthError::from_provider(err)
            })?;

        info!(%user_id, "auth: password updated");
        Ok(())
    }

    fn callback_url(&self, next: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
        format!("{}/auth/callback?next={}", self.site_url, encoded)
    }

    async fn ensure_profile(&self, user: &AuthIdentity, email: &str, full_name: Option<String>) {
        let insert_profile_entity = InsertProfileEntity {
            id: user.id,
            email: user.email.clone().unwrap_or_else(|| email.to_string()),
            full_name,
        };

        match self
            .profile_repo
            .insert_if_missing(insert_profile_entity)
            .await
        {
            Ok(true) => info!(user_id = %user.id, "auth: created missing profile"),
            Ok(false) => {}
            Err(err) => {
                warn!(user_id = %user.id, db_error = ?err, "auth: failed to ensure profile")
            }
        }
    }

    async fn record_event(&self, user_id: Uuid, kind: AuthEventKind, meta: RequestMeta) {
        let insert_auth_event_entity = InsertAuthEventEntity {
            user_id,
            event: kind.to_string(),
            ip: meta.ip,
            user_agent: meta.user_agent,
        };

        if let Err(err) = self.auth_event_repo.record(insert_auth_event_entity).await {
            warn!(%user_id, event = %kind, db_error = ?err, "auth: failed to log auth event");
        }
    }
}

fn validate_email(email: Option<&str>) -> UseCaseResult<String> {
    let email = email.map(str::trim).unwrap_or_default();
    if is_valid_email(email) {
        Ok(email.to_string())
    } else {
        Err(AuthError::Validation("Invalid email address".to_string()))
    }
}

fn validate_password(password: Option<&str>) -> UseCaseResult<String> {
    match password {
        Some(password) if password.chars().count() >= MIN_PASSWORD_LENGTH => {
            Ok(password.to_string())
        }
        _ => Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ))),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Only same-site relative paths survive; anything else lands on the library.
pub fn sanitize_next(next: Option<&str>) -> String {
    next.and_then(same_site_path)
        .unwrap_or_else(|| DEFAULT_NEXT_PATH.to_string())
}

fn same_site_path(next: &str) -> Option<String> {
    if !next.starts_with('/')
        || next.starts_with("//")
        || next
            .chars()
            .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
    {
        return None;
    }

    let base = url::Url::parse(SAME_SITE_BASE).ok()?;
    let resolved = base.join(next).ok()?;
    if resolved.origin() != base.origin() {
        return None;
    }

    let mut path = resolved.path().to_string();
    if let Some(query) = resolved.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}

fn sign_in_error_location(message: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("/signin?error={}", encoded)
}
