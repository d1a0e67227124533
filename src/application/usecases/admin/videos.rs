use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use super::{AdminError, UseCaseResult, write_error};
use crate::{
    application::usecases::catalog::VideoTaxonomy,
    domain::{
        entities::videos::{EditVideoEntity, InsertVideoEntity, VideoEntity},
        repositories::videos::VideoRepository,
        value_objects::{
            taxonomy::is_valid_slug,
            videos::{AdminVideoDto, AdminVideoModel},
        },
    },
};

/// Validated form fields shared by create and update.
#[derive(Debug, Clone, PartialEq)]
struct VideoFields {
    slug: String,
    title: String,
    description: Option<String>,
    duration_seconds: Option<i32>,
    teacher: Option<String>,
    published: bool,
    video_path: Option<String>,
    preview_path: Option<String>,
    thumbnail_path: Option<String>,
    style_ids: Vec<Uuid>,
    level_ids: Vec<Uuid>,
}

impl TryFrom<AdminVideoModel> for VideoFields {
    type Error = AdminError;

    fn try_from(model: AdminVideoModel) -> Result<Self, Self::Error> {
        let title = non_empty(model.title)
            .ok_or_else(|| AdminError::Validation("Title is required".to_string()))?;
        let slug = non_empty(model.slug)
            .ok_or_else(|| AdminError::Validation("Slug is required".to_string()))?;
        if !is_valid_slug(&slug) {
            return Err(AdminError::Validation(
                "Slug must contain only lowercase letters, numbers and hyphens".to_string(),
            ));
        }
        if model.duration_seconds.is_some_and(|seconds| seconds < 0) {
            return Err(AdminError::Validation(
                "Duration cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            slug,
            title,
            description: non_empty(model.description),
            duration_seconds: model.duration_seconds,
            teacher: non_empty(model.teacher),
            published: model.published,
            video_path: non_empty(model.video_path),
            preview_path: non_empty(model.preview_path),
            thumbnail_path: non_empty(model.thumbnail_path),
            style_ids: dedup(model.selected_styles),
            level_ids: dedup(model.selected_levels),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    ids
}

pub struct AdminVideoUseCase<V>
where
    V: VideoRepository + Send + Sync + 'static,
{
    video_repo: Arc<V>,
}

impl<V> AdminVideoUseCase<V>
where
    V: VideoRepository + Send + Sync + 'static,
{
    pub fn new(video_repo: Arc<V>) -> Self {
        Self { video_repo }
    }

    pub async fn list_videos(&self) -> UseCaseResult<Vec<AdminVideoDto>> {
        let videos = self.video_repo.list_all().await.map_err(|err| {
            error!(db_error = ?err, "admin: failed to list videos");
            AdminError::Internal(err)
        })?;
        info!(video_count = videos.len(), "admin: videos loaded");
        self.to_dtos(videos).await
    }

    pub async fn get_video(&self, video_id: Uuid) -> UseCaseResult<AdminVideoDto> {
        let video = self
            .video_repo
            .find_by_id(video_id)
            .await
            .map_err(|err| {
                error!(%video_id, db_error = ?err, "admin: failed to load video");
                AdminError::Internal(err)
            })?
            .ok_or(AdminError::NotFound("Video"))?;

        let mut dtos = self.to_dtos(vec![video]).await?;
        dtos.pop().ok_or(AdminError::NotFound("Video"))
    }

    pub async fn create_video(&self, model: AdminVideoModel) -> UseCaseResult<AdminVideoDto> {
        let fields = VideoFields::try_from(model)?;
        info!(slug = %fields.slug, "admin: creating video");

        let insert_video_entity = InsertVideoEntity {
            slug: fields.slug,
            title: fields.title,
            description: fields.description,
            duration_seconds: fields.duration_seconds,
            teacher: fields.teacher,
            published: fields.published,
            video_path: fields.video_path,
            preview_path: fields.preview_path,
            thumbnail_path: fields.thumbnail_path,
        };

        let video = self
            .video_repo
            .create_video(insert_video_entity, fields.style_ids, fields.level_ids)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "admin: failed to create video");
                write_error(err)
            })?;

        info!(video_id = %video.id, "admin: video created");
        let mut dtos = self.to_dtos(vec![video]).await?;
        dtos.pop().ok_or(AdminError::NotFound("Video"))
    }

    /// Replaces the video's fields and its style/level links together.
    pub async fn update_video(&self, video_id: Uuid, model: AdminVideoModel) -> UseCaseResult<()> {
        let fields = VideoFields::try_from(model)?;

        let edit_video_entity = EditVideoEntity {
            slug: fields.slug,
            title: fields.title,
            description: fields.description,
            duration_seconds: fields.duration_seconds,
            teacher: fields.teacher,
            published: fields.published,
            video_path: fields.video_path,
            preview_path: fields.preview_path,
            thumbnail_path: fields.thumbnail_path,
            updated_at: Utc::now(),
        };

        let updated = self
            .video_repo
            .update_video(video_id, edit_video_entity, fields.style_ids, fields.level_ids)
            .await
            .map_err(|err| {
                error!(%video_id, db_error = ?err, "admin: failed to update video");
                write_error(err)
            })?;
        if !updated {
            return Err(AdminError::NotFound("Video"));
        }

        info!(%video_id, "admin: video updated");
        Ok(())
    }

    pub async fn delete_video(&self, video_id: Uuid) -> UseCaseResult<()> {
        let deleted = self.video_repo.delete_video(video_id).await.map_err(|err| {
            error!(%video_id, db_error = ?err, "admin: failed to delete video");
            AdminError::Internal(err)
        })?;
        if !deleted {
            return Err(AdminError::NotFound("Video"));
        }

        info!(%video_id, "admin: video deleted");
        Ok(())
    }

    async fn to_dtos(&self, videos: Vec<VideoEntity>) -> UseCaseResult<Vec<AdminVideoDto>> {
        if videos.is_empty() {
            return Ok(Vec::new());
        }

        let video_ids: Vec<Uuid> = videos.iter().map(|video| video.id).collect();
        let styles = self
            .video_repo
            .styles_for_videos(video_ids.clone())
            .await
            .map_err(AdminError::Internal)?;
        let levels = self
            .video_repo
            .levels_for_videos(video_ids)
            .await
            .map_err(AdminError::Internal)?;
        let taxonomy = VideoTaxonomy::from_rows(styles, levels);

        Ok(videos
            .into_iter()
            .map(|video| AdminVideoDto {
                styles: taxonomy.styles_of(video.id),
                levels: taxonomy.levels_of(video.id),
                id: video.id,
                slug: video.slug,
                title: video.title,
                description: video.description,
                duration_seconds: video.duration_seconds,
                teacher: video.teacher,
                published: video.published,
                video_path: video.video_path,
                preview_path: video.preview_path,
                thumbnail_path: video.thumbnail_path,
                created_at: video.created_at,
                updated_at: video.updated_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::styles::StyleEntity, repositories::videos::MockVideoRepository,
    };
    use crate::application::usecases::admin::unique_violation;
    use axum::http::StatusCode;
    use mockall::predicate::eq;

    fn model() -> AdminVideoModel {
        AdminVideoModel {
            title: Some("Bachata Sensual Flow".to_string()),
            slug: Some("bachata-sensual-flow".to_string()),
            description: Some("".to_string()),
            duration_seconds: Some(900),
            teacher: Some("Luis".to_string()),
            published: true,
            video_path: Some("".to_string()),
            preview_path: None,
            thumbnail_path: Some("thumbs/flow.jpg".to_string()),
            ..Default::default()
        }
    }

    fn entity_from(insert: &InsertVideoEntity) -> VideoEntity {
        VideoEntity {
            id: Uuid::new_v4(),
            slug: insert.slug.clone(),
            title: insert.title.clone(),
            description: insert.description.clone(),
            duration_seconds: insert.duration_seconds,
            teacher: insert.teacher.clone(),
            published: insert.published,
            video_path: insert.video_path.clone(),
            preview_path: insert.preview_path.clone(),
            thumbnail_path: insert.thumbnail_path.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_nulls_empty_paths_and_links_taxonomy() {
        let style_id = Uuid::new_v4();
        let mut videos = MockVideoRepository::new();
        videos
            .expect_create_video()
            .withf(move |insert, styles, levels| {
                insert.video_path.is_none()
                    && insert.description.is_none()
                    && insert.thumbnail_path.as_deref() == Some("thumbs/flow.jpg")
                    && *styles == vec![style_id]
                    && levels.is_empty()
            })
            .times(1)
            .returning(|insert, _, _| Ok(entity_from(&insert)));
        videos.expect_styles_for_videos().returning(move |ids| {
            Ok(vec![(
                ids[0],
                StyleEntity {
                    id: style_id,
                    name: "Bachata".to_string(),
                    slug: "bachata".to_string(),
                    position: 1,
                    created_at: Utc::now(),
                },
            )])
        });
        videos.expect_levels_for_videos().returning(|_| Ok(vec![]));

        let uc = AdminVideoUseCase::new(Arc::new(videos));
        let video = uc
            .create_video(AdminVideoModel {
                selected_styles: vec![style_id, style_id],
                ..model()
            })
            .await
            .unwrap();

        assert_eq!(video.slug, "bachata-sensual-flow");
        assert_eq!(video.styles.len(), 1);
        assert_eq!(video.video_path, None);
    }

    #[tokio::test]
    async fn create_requires_title_and_clean_slug() {
        let uc = AdminVideoUseCase::new(Arc::new(MockVideoRepository::new()));

        let err = uc
            .create_video(AdminVideoModel {
                title: Some("  ".to_string()),
                ..model()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Title is required");

        let err = uc
            .create_video(AdminVideoModel {
                slug: Some("Bachata Flow".to_string()),
                ..model()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_replaces_links_and_reports_missing_video() {
        let video_id = Uuid::new_v4();
        let level_id = Uuid::new_v4();
        let mut videos = MockVideoRepository::new();
        videos
            .expect_update_video()
            .with(
                eq(video_id),
                mockall::predicate::function(|edit: &EditVideoEntity| edit.published),
                eq(Vec::<Uuid>::new()),
                eq(vec![level_id]),
            )
            .times(1)
            .returning(|_, _, _, _| Ok(true));
        videos
            .expect_update_video()
            .with(
                mockall::predicate::ne(video_id),
                mockall::predicate::always(),
                mockall::predicate::always(),
                mockall::predicate::always(),
            )
            .returning(|_, _, _, _| Ok(false));

        let uc = AdminVideoUseCase::new(Arc::new(videos));
        uc.update_video(
            video_id,
            AdminVideoModel {
                selected_levels: vec![level_id],
                ..model()
            },
        )
        .await
        .unwrap();

        let err = uc.update_video(Uuid::new_v4(), model()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Video not found");
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_validation_error() {
        let mut videos = MockVideoRepository::new();
        videos
            .expect_create_video()
            .returning(|_, _, _| Err(unique_violation()));
        videos
            .expect_update_video()
            .returning(|_, _, _, _| Err(unique_violation()));
        let uc = AdminVideoUseCase::new(Arc::new(videos));

        let err = uc.create_video(model()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Slug already exists");

        let err = uc.update_video(Uuid::new_v4(), model()).await.unwrap_err();
        assert_eq!(err.to_string(), "Slug already exists");

        let mut videos = MockVideoRepository::new();
        videos
            .expect_create_video()
            .returning(|_, _, _| Err(anyhow::anyhow!("connection reset")));
        let err = AdminVideoUseCase::new(Arc::new(videos))
            .create_video(model())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn delete_missing_video_is_not_found() {
        let mut videos = MockVideoRepository::new();
        videos.expect_delete_video().returning(|_| Ok(false));

        let uc = AdminVideoUseCase::new(Arc::new(videos));
        let err = uc.delete_video(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AdminError::NotFound("Video")));
    }
}
