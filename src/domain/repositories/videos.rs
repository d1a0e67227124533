use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        levels::LevelEntity,
        styles::StyleEntity,
        videos::{EditVideoEntity, InsertVideoEntity, VideoEntity},
    },
    value_objects::videos::VideoFilter,
};

#[automock]
#[async_trait]
pub trait VideoRepository {
    /// Published videos only, filtered, ordered and limited per `filter`.
    async fn list_published(&self, filter: VideoFilter) -> Result<Vec<VideoEntity>>;

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<VideoEntity>>;

    async fn list_related(
        &self,
        video_id: Uuid,
        style_ids: Vec<Uuid>,
        limit: i64,
    ) -> Result<Vec<VideoEntity>>;

    async fn styles_for_videos(&self, video_ids: Vec<Uuid>) -> Result<Vec<(Uuid, StyleEntity)>>;

    async fn levels_for_videos(&self, video_ids: Vec<Uuid>) -> Result<Vec<(Uuid, LevelEntity)>>;

    async fn list_all(&self) -> Result<Vec<VideoEntity>>;

    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<VideoEntity>>;

    async fn create_video(
        &self,
        insert_video_entity: InsertVideoEntity,
        style_ids: Vec<Uuid>,
        level_ids: Vec<Uuid>,
    ) -> Result<VideoEntity>;

    /// Returns false when no video has `video_id`.
    async fn update_video(
        &self,
        video_id: Uuid,
        edit_video_entity: EditVideoEntity,
        style_ids: Vec<Uuid>,
        level_ids: Vec<Uuid>,
    ) -> Result<bool>;

    async fn delete_video(&self, video_id: Uuid) -> Result<bool>;

    async fn count_videos(&self) -> Result<i64>;

    async fn count_published_videos(&self) -> Result<i64>;
}
