use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::styles::{EditStyleEntity, InsertStyleEntity, StyleEntity};

#[automock]
#[async_trait]
pub trait StyleRepository {
    /// Ordered by position.
    async fn list_styles(&self) -> Result<Vec<StyleEntity>>;

    /// Appends the style after the current last position.
    async fn create_style(&self, name: String, slug: String) -> Result<StyleEntity>;

    async fn update_style(
        &self,
        style_id: Uuid,
        edit_style_entity: EditStyleEntity,
    ) -> Result<Option<StyleEntity>>;

    async fn delete_style(&self, style_id: Uuid) -> Result<bool>;

    /// Insert or refresh by slug.
    async fn upsert_style(&self, insert_style_entity: InsertStyleEntity) -> Result<StyleEntity>;
}
