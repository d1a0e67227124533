use std::{collections::HashMap, sync::Arc};

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::access::Entitlement,
    domain::{
        entities::{
            levels::LevelEntity, styles::StyleEntity, video_views::InsertVideoViewEntity,
            videos::VideoEntity,
        },
        repositories::{
            levels::LevelRepository, storage::ObjectStorage, styles::StyleRepository,
            video_views::VideoViewRepository, videos::VideoRepository,
        },
        value_objects::{
            auth::SessionUser,
            enums::storage_buckets::StorageBucket,
            taxonomy::{LevelDto, StyleDto, TaxonomyDto},
            videos::{
                PlaybackDto, RELATED_VIDEO_LIMIT, VideoCardDto, VideoDetailDto, VideoFilter,
                format_duration,
            },
        },
    },
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Video not found")]
    VideoNotFound,
    #[error("{0}")]
    InvalidFilter(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::VideoNotFound => StatusCode::NOT_FOUND,
            CatalogError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, CatalogError>;

/// Styles and levels attached to each video, keyed by video id.
#[derive(Debug, Default)]
pub struct VideoTaxonomy {
    pub styles: HashMap<Uuid, Vec<StyleDto>>,
    pub levels: HashMap<Uuid, Vec<LevelDto>>,
}

impl VideoTaxonomy {
    pub fn from_rows(styles: Vec<(Uuid, StyleEntity)>, levels: Vec<(Uuid, LevelEntity)>) -> Self {
        let mut taxonomy = VideoTaxonomy::default();
        for (video_id, style) in styles {
            taxonomy
                .styles
                .entry(video_id)
                .or_default()
                .push(StyleDto::from(style));
        }
        for (video_id, level) in levels {
            taxonomy
                .levels
                .entry(video_id)
                .or_default()
                .push(LevelDto::from(level));
        }
        taxonomy
    }

    pub fn styles_of(&self, video_id: Uuid) -> Vec<StyleDto> {
        self.styles.get(&video_id).cloned().unwrap_or_default()
    }

    pub fn levels_of(&self, video_id: Uuid) -> Vec<LevelDto> {
        self.levels.get(&video_id).cloned().unwrap_or_default()
    }
}

pub struct CatalogUseCase<V, W, S, L, O>
where
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    video_repo: Arc<V>,
    video_view_repo: Arc<W>,
    style_repo: Arc<S>,
    level_repo: Arc<L>,
    storage: Arc<O>,
    signed_url_ttl_seconds: u64,
}

impl<V, W, S, L, O> CatalogUseCase<V, W, S, L, O>
where
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    pub fn new(
        video_repo: Arc<V>,
        video_view_repo: Arc<W>,
        style_repo: Arc<S>,
        level_repo: Arc<L>,
        storage: Arc<O>,
        signed_url_ttl_seconds: u64,
    ) -> Self {
        Self {
            video_repo,
            video_view_repo,
            style_repo,
            level_repo,
            storage,
            signed_url_ttl_seconds,
        }
    }

    pub async fn list_videos(&self, filter: VideoFilter) -> UseCaseResult<Vec<VideoCardDto>> {
        info!(
            style_id = ?filter.style_id,
            level_id = ?filter.level_id,
            sort = ?filter.sort,
            limit = filter.limit,
            "catalog: listing published videos"
        );

        let videos = self
            .video_repo
            .list_published(filter)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "catalog: failed to list videos");
                CatalogError::Internal(err)
            })?;

        self.to_cards(videos).await
    }

    /// An empty query returns nothing rather than the whole library.
    pub async fn search(&self, filter: VideoFilter) -> UseCaseResult<Vec<VideoCardDto>> {
        if filter.search.is_none() {
            return Ok(Vec::new());
        }
        self.list_videos(filter).await
    }

    pub async fn taxonomy(&self) -> UseCaseResult<TaxonomyDto> {
        let styles = self.style_repo.list_styles().await.map_err(|err| {
            error!(db_error = ?err, "catalog: failed to list styles");
            CatalogError::Internal(err)
        })?;
        let levels = self.level_repo.list_levels().await.map_err(|err| {
            error!(db_error = ?err, "catalog: failed to list levels");
            CatalogError::Internal(err)
        })?;

        Ok(TaxonomyDto {
            styles: styles.into_iter().map(StyleDto::from).collect(),
            levels: levels.into_iter().map(LevelDto::from).collect(),
        })
    }

    pub async fn video_detail(
        &self,
        slug: &str,
        session: &SessionUser,
        entitlement: Entitlement,
    ) -> UseCaseResult<VideoDetailDto> {
        let user_id = session.user_id;
        let video = self
            .video_repo
            .find_published_by_slug(slug)
            .await
            .map_err(|err| {
                error!(slug, db_error = ?err, "catalog: failed to load video");
                CatalogError::Internal(err)
            })?
            .ok_or_else(|| {
                info!(slug, "catalog: published video not found");
                CatalogError::VideoNotFound
            })?;

        if let Err(err) = self
            .video_view_repo
            .record_view(InsertVideoViewEntity {
                video_id: video.id,
                user_id: Some(user_id),
            })
            .await
        {
            warn!(video_id = %video.id, %user_id, db_error = ?err, "catalog: failed to record view");
        }

        let taxonomy = self.load_taxonomy(vec![video.id]).await?;
        let styles = taxonomy.styles_of(video.id);
        let levels = taxonomy.levels_of(video.id);

        let style_ids: Vec<Uuid> = styles.iter().map(|style| style.id).collect();
        let related = if style_ids.is_empty() {
            Vec::new()
        } else {
            let related = self
                .video_repo
                .list_related(video.id, style_ids, RELATED_VIDEO_LIMIT)
                .await
                .map_err(|err| {
                    error!(video_id = %video.id, db_error = ?err, "catalog: failed to list related videos");
                    CatalogError::Internal(err)
                })?;
            self.to_cards(related).await?
        };

        let playback = self.playback(&video, entitlement).await?;
        info!(
            video_id = %video.id,
            %user_id,
            full_access = playback.has_subscription,
            "catalog: video detail served"
        );

        Ok(VideoDetailDto {
            id: video.id,
            slug: video.slug,
            title: video.title,
            description: video.description,
            teacher: video.teacher,
            duration_seconds: video.duration_seconds,
            duration: video.duration_seconds.map(format_duration),
            styles,
            levels,
            playback,
            related,
        })
    }

    /// Full video for entitled viewers, preview for everyone else.
    async fn playback(
        &self,
        video: &VideoEntity,
        entitlement: Entitlement,
    ) -> UseCaseResult<PlaybackDto> {
        let has_subscription = entitlement.can_watch_full_videos();

        let video_url = match (&video.video_path, has_subscription) {
            (Some(path), true) => Some(self.sign(StorageBucket::Videos, path).await?),
            _ => None,
        };
        let preview_url = match &video.preview_path {
            Some(path) => Some(self.sign(StorageBucket::Previews, path).await?),
            None => None,
        };

        Ok(PlaybackDto {
            video_url,
            preview_url,
            thumbnail_url: self.thumbnail_url(video),
            has_subscription,
        })
    }

    async fn sign(&self, bucket: StorageBucket, path: &str) -> UseCaseResult<String> {
        self.storage
            .signed_url(bucket, path, self.signed_url_ttl_seconds)
            .await
            .map_err(|err| {
                error!(%bucket, path, storage_error = ?err, "catalog: failed to sign media url");
                CatalogError::Internal(err)
            })
    }

    fn thumbnail_url(&self, video: &VideoEntity) -> Option<String> {
        video
            .thumbnail_path
            .as_deref()
            .map(|path| self.storage.public_url(StorageBucket::Thumbnails, path))
    }

    async fn load_taxonomy(&self, video_ids: Vec<Uuid>) -> UseCaseResult<VideoTaxonomy> {
        let styles = self
            .video_repo
            .styles_for_videos(video_ids.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "catalog: failed to load video styles");
                CatalogError::Internal(err)
            })?;
        let levels = self
            .video_repo
            .levels_for_videos(video_ids)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "catalog: failed to load video levels");
                CatalogError::Internal(err)
            })?;

        Ok(VideoTaxonomy::from_rows(styles, levels))
    }

    async fn to_cards(&self, videos: Vec<VideoEntity>) -> UseCaseResult<Vec<VideoCardDto>> {
        if videos.is_empty() {
            return Ok(Vec::new());
        }

        let taxonomy = self
            .load_taxonomy(videos.iter().map(|video| video.id).collect())
            .await?;

        Ok(videos
            .into_iter()
            .map(|video| VideoCardDto {
                id: video.id,
                thumbnail_url: self.thumbnail_url(&video),
                styles: taxonomy.styles_of(video.id),
                levels: taxonomy.levels_of(video.id),
                duration: video.duration_seconds.map(format_duration),
                duration_seconds: video.duration_seconds,
                slug: video.slug,
                title: video.title,
            })
            .collect())
    }
}
