use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::profiles::{InsertProfileEntity, ProfileEntity};

#[automock]
#[async_trait]
pub trait ProfileRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<ProfileEntity>>;

    /// Inserts the row unless one already exists; returns whether a row was created.
    async fn insert_if_missing(&self, insert_profile_entity: InsertProfileEntity) -> Result<bool>;

    async fn update_full_name(
        &self,
        user_id: Uuid,
        full_name: Option<String>,
    ) -> Result<Option<ProfileEntity>>;
}
