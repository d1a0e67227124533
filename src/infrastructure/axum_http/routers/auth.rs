use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::{WithRejection, cookie::CookieJar};

use crate::{
    application::usecases::auth::{AuthUseCase, DEFAULT_NEXT_PATH, SignInOutcome},
    domain::{
        repositories::{
            auth_events::AuthEventRepository, auth_provider::AuthProvider,
            profiles::ProfileRepository,
        },
        value_objects::auth::{
            CallbackParams, MessageResponse, NextQuery, OAuthUrlResponse, RequestMeta,
            ResetPasswordModel, SignInModel, SignInResponse, SignUpModel, SignedInUserDto,
            UpdatePasswordModel,
        },
    },
    infrastructure::{
        axum_http::{
            auth::{AuthState, AuthUser, CODE_VERIFIER_COOKIE, MaybeAuthUser},
            error_responses::AppError,
        },
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{auth_events::AuthEventPostgres, profiles::ProfilePostgres},
        },
        supabase::auth_client::SupabaseAuthClient,
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    auth_client: Arc<SupabaseAuthClient>,
    site_url: String,
) -> Router {
    let profile_repository = ProfilePostgres::new(Arc::clone(&db_pool));
    let auth_event_repository = AuthEventPostgres::new(Arc::clone(&db_pool));
    let auth_usecase = AuthUseCase::new(
        auth_client,
        Arc::new(profile_repository),
        Arc::new(auth_event_repository),
        site_url,
    );

    router(Arc::new(auth_usecase))
}

pub fn router<A, P, E>(auth_usecase: Arc<AuthUseCase<A, P, E>>) -> Router
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/update-password", post(update_password))
        .route("/auth/callback", get(callback))
        .with_state(auth_usecase)
}

fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string())
    };

    let ip = header("x-forwarded-for")
        .and_then(|value| value.split(',').next().map(|ip| ip.trim().to_string()))
        .or_else(|| header("x-real-ip"))
        .unwrap_or_else(|| "unknown".to_string());

    RequestMeta {
        ip,
        user_agent: header("user-agent").unwrap_or_else(|| "unknown".to_string()),
    }
}

pub async fn sign_up<A, P, E>(
    State(auth_usecase): State<Arc<AuthUseCase<A, P, E>>>,
    WithRejection(Json(sign_up_model), _): WithRejection<Json<SignUpModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    let response = auth_usecase.sign_up(sign_up_model).await?;
    Ok(Json(response))
}

pub async fn sign_in<A, P, E>(
    State(auth_usecase): State<Arc<AuthUseCase<A, P, E>>>,
    Extension(auth_state): Extension<Arc<AuthState>>,
    WithRejection(Query(next_query), _): WithRejection<Query<NextQuery>, AppError>,
    headers: HeaderMap,
    jar: CookieJar,
    WithRejection(Json(sign_in_model), _): WithRejection<Json<SignInModel>, AppError>,
) -> Result<Response, AppError>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    let outcome = auth_usecase
        .sign_in(sign_in_model, next_query.next.as_deref(), request_meta(&headers))
        .await?;

    let response = match outcome {
        SignInOutcome::OAuth { url, code_verifier } => (
            auth_state.with_code_verifier(jar, code_verifier),
            Json(OAuthUrlResponse { url }),
        )
            .into_response(),
        SignInOutcome::MagicLink {
            message,
            code_verifier,
        } => (
            auth_state.with_code_verifier(jar, code_verifier),
            Json(MessageResponse { message }),
        )
            .into_response(),
        SignInOutcome::Password {
            session,
            redirect_to,
        } => {
            let body = SignInResponse {
                user: SignedInUserDto {
                    id: session.user.id,
                    email: session.user.email.clone(),
                },
                redirect_to,
            };
            (auth_state.with_session(jar, &session), Json(body)).into_response()
        }
    };

    Ok(response)
}

pub async fn sign_out<A, P, E>(
    State(auth_usecase): State<Arc<AuthUseCase<A, P, E>>>,
    Extension(auth_state): Extension<Arc<AuthState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    auth_usecase
        .sign_out(
            user.as_ref().map(|user| user.access_token.as_str()),
            user.as_ref().map(|user| user.session.user_id),
            request_meta(&headers),
        )
        .await?;

    Ok((
        auth_state.without_session(jar),
        Json(MessageResponse {
            message: "Signed out successfully".to_string(),
        }),
    ))
}

pub async fn callback<A, P, E>(
    State(auth_usecase): State<Arc<AuthUseCase<A, P, E>>>,
    Extension(auth_state): Extension<Arc<AuthState>>,
    WithRejection(Query(params), _): WithRejection<Query<CallbackParams>, AppError>,
    jar: CookieJar,
) -> impl IntoResponse
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    let code_verifier = jar
        .get(CODE_VERIFIER_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let outcome = auth_usecase
        .handle_callback(params, code_verifier.as_deref())
        .await;

    let mut jar = auth_state.without_code_verifier(jar);
    if let Some(session) = outcome.session.as_ref() {
        jar = auth_state.with_session(jar, session);
    }

    (jar, temporary_redirect(&outcome.location))
}

fn temporary_redirect(location: &str) -> Response {
    let location = HeaderValue::try_from(location)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_NEXT_PATH));
    (StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response()
}

pub async fn reset_password<A, P, E>(
    State(auth_usecase): State<Arc<AuthUseCase<A, P, E>>>,
    WithRejection(Json(reset_password_model), _): WithRejection<Json<ResetPasswordModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    auth_usecase
        .request_password_reset(reset_password_model)
        .await?;

    Ok(Json(MessageResponse {
        message: "Check your email for the password reset link".to_string(),
    }))
}

pub async fn update_password<A, P, E>(
    State(auth_usecase): State<Arc<AuthUseCase<A, P, E>>>,
    user: AuthUser,
    WithRejection(Json(update_password_model), _): WithRejection<
        Json<UpdatePasswordModel>,
        AppError,
    >,
) -> Result<impl IntoResponse, AppError>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    E: AuthEventRepository + Send + Sync + 'static,
{
    auth_usecase
        .update_password(
            user.session.user_id,
            &user.access_token,
            update_password_model,
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::usecases::access::AccessGate,
        domain::{
            repositories::{
                auth_events::MockAuthEventRepository, auth_provider::MockAuthProvider,
                profiles::MockProfileRepository, subscriptions::MockSubscriptionRepository,
            },
            value_objects::auth::{AuthIdentity, AuthSession, PkceStart},
        },
    };
    use axum::{
        body::{Body, to_bytes},
        http::{
            Request,
            header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        },
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app(provider: MockAuthProvider, profiles: MockProfileRepository) -> Router {
        let mut events = MockAuthEventRepository::new();
        events.expect_record().returning(|_| Ok(()));
        let usecase = AuthUseCase::new(
            Arc::new(provider),
            Arc::new(profiles),
            Arc::new(events),
            "https://caliente.test".to_string(),
        );
        let gate = AccessGate::new(
            Arc::new(MockProfileRepository::new()),
            Arc::new(MockSubscriptionRepository::new()),
        );

        router(Arc::new(usecase)).layer(Extension(Arc::new(AuthState::new(
            "secret".to_string(),
            gate,
            true,
        ))))
    }

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            expires_in: 3600,
            user: AuthIdentity {
                id: Uuid::new_v4(),
                email: Some("ana@example.com".to_string()),
                email_confirmed_at: None,
                user_metadata: serde_json::json!({ "name": "Ana" }),
            },
        }
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn password_sign_in_sets_session_cookies() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_sign_in_with_password()
            .returning(|_, _| Ok(session()));
        let mut profiles = MockProfileRepository::new();
        profiles.expect_insert_if_missing().returning(|_| Ok(false));

        let response = app(provider, profiles)
            .oneshot(
                Request::post("/api/auth/sign-in?next=/videos/salsa-basics")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email":"ana@example.com","password":"secret123"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|cookie| cookie.starts_with("sb-access-token=access-token")
            && cookie.contains("HttpOnly")
            && cookie.contains("Secure")));
        assert!(cookies.iter().any(|cookie| cookie.starts_with("sb-refresh-token=refresh-token")));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["redirectTo"], "/videos/salsa-basics");
        assert_eq!(body["user"]["email"], "ana@example.com");
    }

    #[tokio::test]
    async fn oauth_sign_in_stores_code_verifier() {
        let mut provider = MockAuthProvider::new();
        provider.expect_start_oauth().returning(|_, _| {
            Ok(PkceStart {
                url: Some("https://project.supabase.test/auth/v1/authorize?provider=google".to_string()),
                code_verifier: "verifier-123".to_string(),
            })
        });

        let response = app(provider, MockProfileRepository::new())
            .oneshot(
                Request::post("/api/auth/sign-in")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"provider":"google"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            set_cookies(&response)
                .iter()
                .any(|cookie| cookie.starts_with("sb-code-verifier=verifier-123"))
        );
    }

    #[tokio::test]
    async fn callback_exchanges_code_and_redirects() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_exchange_code()
            .withf(|code, verifier| code == "code-1" && verifier == "verifier-123")
            .returning(|_, _| Ok(session()));
        let mut profiles = MockProfileRepository::new();
        profiles.expect_insert_if_missing().returning(|_| Ok(true));

        let response = app(provider, profiles)
            .oneshot(
                Request::get("/auth/callback?code=code-1&next=/account")
                    .header(COOKIE, "sb-code-verifier=verifier-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[LOCATION], "/account");
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|cookie| cookie.starts_with("sb-access-token=access-token")));
        assert!(cookies.iter().any(|cookie| cookie.starts_with("sb-code-verifier=;")));
    }

    async fn callback_location(next: &str) -> (StatusCode, String) {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_exchange_code()
            .returning(|_, _| Ok(session()));
        let mut profiles = MockProfileRepository::new();
        profiles.expect_insert_if_missing().returning(|_| Ok(false));

        let response = app(provider, profiles)
            .oneshot(
                Request::get(format!("/auth/callback?code=c&next={}", next))
                    .header(COOKIE, "sb-code-verifier=verifier-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let location = response.headers()[LOCATION].to_str().unwrap().to_string();
        (status, location)
    }

    #[tokio::test]
    async fn callback_with_tab_in_next_stays_on_site() {
        let (status, location) = callback_location("%2F%09%2Fevil.example").await;

        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location, "/videos");
    }

    #[tokio::test]
    async fn callback_with_newline_in_next_redirects_to_library() {
        let (status, location) = callback_location("%2Fvideos%0A").await;

        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location, "/videos");
    }

    #[tokio::test]
    async fn sign_out_with_stale_session_still_clears_cookies() {
        let mut provider = MockAuthProvider::new();
        provider.expect_sign_out().never();

        let response = app(provider, MockProfileRepository::new())
            .oneshot(
                Request::post("/api/auth/sign-out")
                    .header(COOKIE, "sb-access-token=expired; sb-refresh-token=old")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|cookie| cookie.starts_with("sb-access-token=;")));
        assert!(cookies.iter().any(|cookie| cookie.starts_with("sb-refresh-token=;")));
    }

    #[tokio::test]
    async fn sign_up_validation_error_is_bad_request() {
        let response = app(MockAuthProvider::new(), MockProfileRepository::new())
            .oneshot(
                Request::post("/api/auth/sign-up")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"not-an-email","password":"secret123"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
