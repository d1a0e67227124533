use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    application::usecases::access::{AccessError, AccessGate},
    domain::value_objects::auth::{AuthSession, SessionUser},
    infrastructure::axum_http::error_responses::AppError,
};

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

const REFRESH_TOKEN_MAX_AGE_DAYS: i64 = 30;
const CODE_VERIFIER_MAX_AGE_MINUTES: i64 = 10;

#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub exp: usize,
}

pub fn validate_supabase_jwt(token: &str, jwt_secret: &str) -> Result<SupabaseClaims> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&["authenticated"]);

    let token_data = decode::<SupabaseClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

/// `Authorization: Bearer` first, then the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Shared by every extractor; installed once as an `Extension` on the app router.
pub struct AuthState {
    pub jwt_secret: String,
    pub access_gate: AccessGate,
    pub secure_cookies: bool,
}

impl AuthState {
    pub fn new(jwt_secret: String, access_gate: AccessGate, secure_cookies: bool) -> Self {
        Self {
            jwt_secret,
            access_gate,
            secure_cookies,
        }
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .build()
    }

    pub fn with_session(&self, jar: CookieJar, session: &AuthSession) -> CookieJar {
        let mut access = self.cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone());
        access.set_max_age(cookie::time::Duration::seconds(session.expires_in.max(0)));
        let mut refresh = self.cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.clone());
        refresh.set_max_age(cookie::time::Duration::days(REFRESH_TOKEN_MAX_AGE_DAYS));

        jar.add(access).add(refresh)
    }

    pub fn with_code_verifier(&self, jar: CookieJar, code_verifier: String) -> CookieJar {
        let mut verifier = self.cookie(CODE_VERIFIER_COOKIE, code_verifier);
        verifier.set_max_age(cookie::time::Duration::minutes(CODE_VERIFIER_MAX_AGE_MINUTES));
        jar.add(verifier)
    }

    pub fn without_session(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
            .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"))
    }

    pub fn without_code_verifier(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(CODE_VERIFIER_COOKIE).path("/"))
    }
}

fn auth_state(parts: &Parts) -> Result<Arc<AuthState>, AppError> {
    parts
        .extensions
        .get::<Arc<AuthState>>()
        .cloned()
        .context("auth state extension is not installed")
        .map_err(AppError::Internal)
}

fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

/// A verified session: token signature, audience and expiry checked, role loaded from the profile.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub session: SessionUser,
    pub access_token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = auth_state(parts)?;
        let unauthenticated = || {
            AppError::from(AccessError::Unauthenticated {
                next: requested_path(parts),
            })
        };

        let token = session_token(&parts.headers).ok_or_else(unauthenticated)?;
        let claims = validate_supabase_jwt(&token, &auth_state.jwt_secret).map_err(|err| {
            debug!(error = %err, "auth: rejected session token");
            unauthenticated()
        })?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| unauthenticated())?;

        let session = auth_state
            .access_gate
            .session_for(user_id, claims.email)
            .await?;

        Ok(AuthUser {
            session,
            access_token: token,
        })
    }
}

/// Like `AuthUser` but a missing or invalid session is `None` instead of a 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(AppError::Internal(err)) => Err(AppError::Internal(err)),
            Err(_) => Ok(MaybeAuthUser(None)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let auth_state = auth_state(parts)?;
        auth_state.access_gate.require_admin(&user.session).await?;
        Ok(AdminUser(user.session))
    }
}

#[cfg(test)]
mod tests;
