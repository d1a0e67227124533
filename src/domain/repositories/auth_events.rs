use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::auth_events::InsertAuthEventEntity;

#[automock]
#[async_trait]
pub trait AuthEventRepository {
    async fn record(&self, insert_auth_event_entity: InsertAuthEventEntity) -> Result<()>;
}
