use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::usecases::access::AccessGate,
    domain::{
        entities::{profiles::ProfileEntity, subscriptions::SubscriptionEntity},
        repositories::{profiles::MockProfileRepository, subscriptions::MockSubscriptionRepository},
        value_objects::enums::roles::Role,
    },
    infrastructure::axum_http::auth::AuthState,
};

pub const JWT_SECRET: &str = "router-test-secret";

pub fn bearer_for(user_id: Uuid) -> String {
    let token = encode(
        &Header::default(),
        &json!({
            "sub": user_id.to_string(),
            "aud": "authenticated",
            "role": "authenticated",
            "email": "dancer@example.com",
            "exp": 9_999_999_999u64,
        }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

/// Gate backed by one stored profile role and an optional subscription row.
pub fn auth_state(role: Role, subscription: Option<SubscriptionEntity>) -> Arc<AuthState> {
    let mut profiles = MockProfileRepository::new();
    profiles.expect_find_by_id().returning(move |id| {
        Ok(Some(ProfileEntity {
            id,
            email: "dancer@example.com".to_string(),
            full_name: None,
            avatar_url: None,
            role: role.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }))
    });
    let mut subscriptions = MockSubscriptionRepository::new();
    subscriptions
        .expect_find_by_user_id()
        .returning(move |_| Ok(subscription.clone()));

    Arc::new(AuthState::new(
        JWT_SECRET.to_string(),
        AccessGate::new(Arc::new(profiles), Arc::new(subscriptions)),
        false,
    ))
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
