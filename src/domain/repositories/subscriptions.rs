use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{
    EditSubscriptionStatusEntity, SubscriberEntity, SubscriptionEntity, UpsertSubscriptionEntity,
};

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_customer_id(&self, customer_id: &str) -> Result<Option<SubscriptionEntity>>;

    /// Insert or overwrite the row keyed by `user_id`.
    async fn upsert_subscription(&self, upsert_entity: UpsertSubscriptionEntity) -> Result<()>;

    async fn update_status_by_user_id(
        &self,
        user_id: Uuid,
        edit_entity: EditSubscriptionStatusEntity,
    ) -> Result<()>;

    async fn count_active(&self, now: DateTime<Utc>) -> Result<i64>;

    async fn list_subscribers(&self) -> Result<Vec<SubscriberEntity>>;
}
