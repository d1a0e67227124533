use super::*;
use crate::domain::{
    entities::profiles::ProfileEntity,
    repositories::{profiles::MockProfileRepository, subscriptions::MockSubscriptionRepository},
    value_objects::enums::roles::Role,
};
use axum::{
    Extension, Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::COOKIE},
    routing::get,
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use tower::ServiceExt;

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

#[derive(Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    aud: &'a str,
    role: &'a str,
    email: Option<&'a str>,
    exp: usize,
}

fn token_with(secret: &str, aud: &str, exp: usize) -> String {
    encode(
        &Header::default(),
        &TestClaims {
            sub: USER_ID,
            aud,
            role: "authenticated",
            email: Some("test@example.com"),
            exp,
        },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn valid_token() -> String {
    token_with(SECRET, "authenticated", 9_999_999_999)
}

fn auth_state(stored_role: Option<&'static str>) -> Arc<AuthState> {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_id().returning(move |id| {
        Ok(stored_role.map(|role| ProfileEntity {
            id,
            email: "test@example.com".to_string(),
            full_name: None,
            avatar_url: None,
            role: role.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }))
    });
    let gate = AccessGate::new(
        Arc::new(profiles),
        Arc::new(MockSubscriptionRepository::new()),
    );
    Arc::new(AuthState::new(SECRET.to_string(), gate, false))
}

fn app(stored_role: Option<&'static str>) -> Router {
    Router::new()
        .route(
            "/me",
            get(|user: AuthUser| async move { user.session.user_id.to_string() }),
        )
        .route(
            "/admin-only",
            get(|AdminUser(admin): AdminUser| async move { admin.role.to_string() }),
        )
        .route(
            "/maybe",
            get(|MaybeAuthUser(user): MaybeAuthUser| async move {
                user.map(|user| user.session.user_id.to_string())
                    .unwrap_or_else(|| "anonymous".to_string())
            }),
        )
        .layer(Extension(auth_state(stored_role)))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[test]
fn test_validate_supabase_jwt_success() {
    let claims = validate_supabase_jwt(&valid_token(), SECRET).expect("Valid token should pass");
    assert_eq!(claims.sub, USER_ID);
    assert_eq!(claims.email.as_deref(), Some("test@example.com"));
}

#[test]
fn test_validate_supabase_jwt_expired() {
    let token = token_with(SECRET, "authenticated", 1);
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_invalid_signature() {
    let token = token_with("wrongsecret", "authenticated", 9_999_999_999);
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_rejects_other_audience() {
    let token = token_with(SECRET, "service_role", 9_999_999_999);
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn bearer_header_wins_over_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, "Bearer from-header".parse().unwrap());
    headers.insert(COOKIE, "sb-access-token=from-cookie".parse().unwrap());
    assert_eq!(session_token(&headers).as_deref(), Some("from-header"));

    headers.remove(AUTHORIZATION);
    assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));

    headers.remove(COOKIE);
    assert_eq!(session_token(&headers), None);
}

#[tokio::test]
async fn missing_session_is_unauthorized_with_sign_in_redirect() {
    let (status, body) = call(
        app(Some("member")),
        Request::get("/me?tab=1").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["redirect_to"], "/signin?next=%2Fme%3Ftab%3D1");
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let (status, body) = call(
        app(Some("member")),
        Request::get("/me")
            .header(COOKIE, format!("sb-access-token={}", valid_token()))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, USER_ID);
}

#[tokio::test]
async fn admin_route_requires_admin_profile_role() {
    let request = || {
        Request::get("/admin-only")
            .header(AUTHORIZATION, format!("Bearer {}", valid_token()))
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = call(app(Some("member")), request()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["redirect_to"], "/");

    // No profile row never grants admin.
    let (status, _) = call(app(None), request()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(app(Some("admin")), request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Role::Admin.to_string());
}

#[tokio::test]
async fn optional_session_falls_back_to_anonymous() {
    let (status, body) = call(
        app(Some("member")),
        Request::get("/maybe")
            .header(AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "anonymous");
}

#[test]
fn session_cookies_are_http_only_and_cleared_on_sign_out() {
    let state = auth_state(None);
    let session = AuthSession {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_in: 3600,
        user: crate::domain::value_objects::auth::AuthIdentity {
            id: Uuid::parse_str(USER_ID).unwrap(),
            email: None,
            email_confirmed_at: None,
            user_metadata: serde_json::Value::Null,
        },
    };

    let jar = state.with_session(CookieJar::new(), &session);
    let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
    assert_eq!(access.value(), "access");
    assert_eq!(access.http_only(), Some(true));
    assert_eq!(access.secure(), Some(false));
    assert_eq!(jar.get(REFRESH_TOKEN_COOKIE).unwrap().value(), "refresh");

    let jar = state.without_session(jar);
    assert!(jar.get(ACCESS_TOKEN_COOKIE).is_none());
    assert!(jar.get(REFRESH_TOKEN_COOKIE).is_none());
}
