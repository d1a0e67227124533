use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::video_views::InsertVideoViewEntity;

#[automock]
#[async_trait]
pub trait VideoViewRepository {
    async fn record_view(&self, insert_video_view_entity: InsertVideoViewEntity) -> Result<()>;

    async fn count_views(&self) -> Result<i64>;
}
