use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::levels::{InsertLevelEntity, LevelEntity};

#[automock]
#[async_trait]
pub trait LevelRepository {
    /// Ordered by position.
    async fn list_levels(&self) -> Result<Vec<LevelEntity>>;

    /// Appends the level after the current last position.
    async fn create_level(&self, name: String) -> Result<LevelEntity>;

    async fn rename_level(&self, level_id: Uuid, name: String) -> Result<Option<LevelEntity>>;

    async fn delete_level(&self, level_id: Uuid) -> Result<bool>;

    /// Insert or refresh by name.
    async fn upsert_level(&self, insert_level_entity: InsertLevelEntity) -> Result<LevelEntity>;
}
