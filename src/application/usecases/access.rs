use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::{profiles::ProfileRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        auth::SessionUser, enums::roles::Role, subscriptions::is_subscription_active,
    },
};

const PUBLIC_PATHS: [&str; 5] = ["/", "/pricing", "/signin", "/signup", "/reset-password"];
const MEMBER_PREFIXES: [&str; 3] = ["/videos", "/account", "/search"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Member,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    SignIn { next: String },
    Home,
}

impl AccessDecision {
    pub fn redirect_to(&self) -> Option<String> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::SignIn { next } => Some(sign_in_redirect(next)),
            AccessDecision::Home => Some("/".to_string()),
        }
    }
}

pub fn sign_in_redirect(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/signin?next={}", encoded)
}

pub fn classify_path(path: &str) -> RouteAccess {
    if PUBLIC_PATHS.contains(&path) || path.starts_with("/auth/callback") {
        return RouteAccess::Public;
    }
    if path.starts_with("/admin") {
        return RouteAccess::Admin;
    }
    if MEMBER_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return RouteAccess::Member;
    }
    RouteAccess::Public
}

/// The one role gate: public passes, anonymous goes to sign-in, non-admins on admin routes go home.
pub fn decide(path: &str, session: Option<&SessionUser>) -> AccessDecision {
    let access = classify_path(path);
    if access == RouteAccess::Public {
        return AccessDecision::Allow;
    }

    let Some(session) = session else {
        return AccessDecision::SignIn {
            next: path.to_string(),
        };
    };

    if access == RouteAccess::Admin && !session.role.is_admin() {
        return AccessDecision::Home;
    }

    AccessDecision::Allow
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated { next: String },
    #[error("Admin access required")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccessError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AccessError::Forbidden => StatusCode::FORBIDDEN,
            AccessError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn redirect_to(&self) -> Option<String> {
        match self {
            AccessError::Unauthenticated { next } => Some(sign_in_redirect(next)),
            AccessError::Forbidden => Some("/".to_string()),
            AccessError::Internal(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub role: Role,
    pub has_active_subscription: bool,
}

impl Entitlement {
    /// Admins always see full content.
    pub fn can_watch_full_videos(&self) -> bool {
        self.role.is_admin() || self.has_active_subscription
    }
}

#[derive(Debug, Serialize)]
pub struct AccessCheckDto {
    #[serde(flatten)]
    pub decision: AccessDecision,
    pub redirect_to: Option<String>,
    pub authenticated: bool,
    pub role: Option<Role>,
}

/// Resolves roles and paywall entitlement from the stored profile and subscription rows.
pub struct AccessGate {
    profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
}

impl AccessGate {
    pub fn new(
        profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
        subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    ) -> Self {
        Self {
            profile_repo,
            subscription_repo,
        }
    }

    /// A missing profile row resolves to `member`; it never grants admin.
    pub async fn role_of(&self, user_id: Uuid) -> Result<Role, AccessError> {
        let profile = self.profile_repo.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "access: failed to load profile role");
            AccessError::Internal(err)
        })?;

        match profile {
            Some(profile) => Ok(Role::from_str(&profile.role)),
            None => {
                warn!(%user_id, "access: profile missing, treating as member");
                Ok(Role::Member)
            }
        }
    }

    pub async fn session_for(
        &self,
        user_id: Uuid,
        email: Option<String>,
    ) -> Result<SessionUser, AccessError> {
        let role = self.role_of(user_id).await?;
        Ok(SessionUser {
            user_id,
            email,
            role,
        })
    }

    pub async fn require_admin(&self, session: &SessionUser) -> Result<(), AccessError> {
        if session.role.is_admin() {
            debug!(user_id = %session.user_id, "access: admin granted");
            return Ok(());
        }
        warn!(user_id = %session.user_id, role = %session.role, "access: admin denied");
        Err(AccessError::Forbidden)
    }

    pub async fn has_active_subscription(&self, user_id: Uuid) -> Result<bool, AccessError> {
        let subscription = self
            .subscription_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "access: failed to load subscription");
                AccessError::Internal(err)
            })?;

        Ok(subscription
            .map(|subscription| is_subscription_active(&subscription, Utc::now()))
            .unwrap_or(false))
    }

    pub async fn entitlement(&self, session: &SessionUser) -> Result<Entitlement, AccessError> {
        let has_active_subscription = self.has_active_subscription(session.user_id).await?;
        Ok(Entitlement {
            role: session.role,
            has_active_subscription,
        })
    }

    pub fn check(&self, path: &str, session: Option<&SessionUser>) -> AccessCheckDto {
        let decision = decide(path, session);
        AccessCheckDto {
            redirect_to: decision.redirect_to(),
            decision,
            authenticated: session.is_some(),
            role: session.map(|session| session.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{profiles::ProfileEntity, subscriptions::SubscriptionEntity},
        repositories::{
            profiles::MockProfileRepository, subscriptions::MockSubscriptionRepository,
        },
    };
    use chrono::Duration;
    use mockall::predicate::eq;

    fn session(role: Role) -> SessionUser {
        SessionUser {
            user_id: Uuid::new_v4(),
            email: Some("dancer@example.com".to_string()),
            role,
        }
    }

    fn profile(user_id: Uuid, role: &str) -> ProfileEntity {
        ProfileEntity {
            id: user_id,
            email: "dancer@example.com".to_string(),
            full_name: None,
            avatar_url: None,
            role: role.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn gate(profiles: MockProfileRepository, subscriptions: MockSubscriptionRepository) -> AccessGate {
        AccessGate::new(Arc::new(profiles), Arc::new(subscriptions))
    }

    #[test]
    fn classifies_routes() {
        assert_eq!(classify_path("/"), RouteAccess::Public);
        assert_eq!(classify_path("/pricing"), RouteAccess::Public);
        assert_eq!(classify_path("/auth/callback"), RouteAccess::Public);
        assert_eq!(classify_path("/auth/callback?code=1"), RouteAccess::Public);
        assert_eq!(classify_path("/admin"), RouteAccess::Admin);
        assert_eq!(classify_path("/admin/videos/new"), RouteAccess::Admin);
        assert_eq!(classify_path("/videos/salsa-101"), RouteAccess::Member);
        assert_eq!(classify_path("/account"), RouteAccess::Member);
        assert_eq!(classify_path("/search"), RouteAccess::Member);
        assert_eq!(classify_path("/about"), RouteAccess::Public);
    }

    #[test]
    fn anonymous_visitor_is_sent_to_sign_in_with_next() {
        let decision = decide("/videos", None);
        assert_eq!(
            decision,
            AccessDecision::SignIn {
                next: "/videos".to_string()
            }
        );
        assert_eq!(decision.redirect_to().as_deref(), Some("/signin?next=%2Fvideos"));
        assert_eq!(decide("/admin", None).redirect_to().as_deref(), Some("/signin?next=%2Fadmin"));
    }

    #[test]
    fn role_check_permits_admins_and_denies_members() {
        let admin = session(Role::Admin);
        let member = session(Role::Member);

        assert_eq!(decide("/admin/styles", Some(&admin)), AccessDecision::Allow);
        assert_eq!(decide("/admin/styles", Some(&member)), AccessDecision::Home);
        assert_eq!(decide("/videos", Some(&member)), AccessDecision::Allow);
        assert_eq!(decide("/videos", Some(&admin)), AccessDecision::Allow);
    }

    #[tokio::test]
    async fn role_is_read_from_profile() {
        let user_id = Uuid::new_v4();
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |id| Ok(Some(profile(id, "admin"))));

        let gate = gate(profiles, MockSubscriptionRepository::new());
        let session = gate.session_for(user_id, None).await.unwrap();

        assert_eq!(session.role, Role::Admin);
        assert!(gate.require_admin(&session).await.is_ok());
    }

    #[tokio::test]
    async fn missing_profile_is_a_member_and_denied_admin() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_by_id().returning(|_| Ok(None));

        let gate = gate(profiles, MockSubscriptionRepository::new());
        let session = gate.session_for(Uuid::new_v4(), None).await.unwrap();

        assert_eq!(session.role, Role::Member);
        let err = gate.require_admin(&session).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.redirect_to().as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn entitlement_reflects_active_subscription() {
        let member = session(Role::Member);
        let user_id = member.user_id;
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions
            .expect_find_by_user_id()
            .with(eq(user_id))
            .returning(move |id| {
                Ok(Some(SubscriptionEntity {
                    user_id: id,
                    stripe_customer_id: Some("cus_1".to_string()),
                    stripe_subscription_id: Some("sub_1".to_string()),
                    status: "active".to_string(),
                    price_id: None,
                    current_period_end: Some(Utc::now() + Duration::days(10)),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }))
            });

        let gate = gate(MockProfileRepository::new(), subscriptions);
        let entitlement = gate.entitlement(&member).await.unwrap();

        assert!(entitlement.has_active_subscription);
        assert!(entitlement.can_watch_full_videos());
    }

    #[tokio::test]
    async fn admin_without_subscription_can_still_watch() {
        let admin = session(Role::Admin);
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions.expect_find_by_user_id().returning(|_| Ok(None));

        let gate = gate(MockProfileRepository::new(), subscriptions);
        let entitlement = gate.entitlement(&admin).await.unwrap();

        assert!(!entitlement.has_active_subscription);
        assert!(entitlement.can_watch_full_videos());
    }
}
