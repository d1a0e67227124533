use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use super::{AdminError, UseCaseResult};
use crate::domain::{
    repositories::{
        subscriptions::SubscriptionRepository, video_views::VideoViewRepository,
        videos::VideoRepository,
    },
    value_objects::{dashboard::DashboardDto, subscriptions::SubscriberDto},
};

pub struct DashboardUseCase<S, V, W>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    video_repo: Arc<V>,
    video_view_repo: Arc<W>,
    monthly_price_minor: i64,
}

impl<S, V, W> DashboardUseCase<S, V, W>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        video_repo: Arc<V>,
        video_view_repo: Arc<W>,
        monthly_price_minor: i64,
    ) -> Self {
        Self {
            subscription_repo,
            video_repo,
            video_view_repo,
            monthly_price_minor,
        }
    }

    pub async fn dashboard(&self) -> UseCaseResult<DashboardDto> {
        let active_subscribers = self
            .subscription_repo
            .count_active(Utc::now())
            .await
            .map_err(|err| internal("active subscribers", err))?;
        let total_videos = self
            .video_repo
            .count_videos()
            .await
            .map_err(|err| internal("videos", err))?;
        let published_videos = self
            .video_repo
            .count_published_videos()
            .await
            .map_err(|err| internal("published videos", err))?;
        let total_views = self
            .video_view_repo
            .count_views()
            .await
            .map_err(|err| internal("views", err))?;

        let dashboard = DashboardDto {
            active_subscribers,
            estimated_mrr_minor: active_subscribers.saturating_mul(self.monthly_price_minor),
            total_videos,
            published_videos,
            total_views,
        };
        info!(
            active_subscribers,
            total_videos, published_videos, total_views, "admin: dashboard computed"
        );
        Ok(dashboard)
    }

    /// Newest first.
    pub async fn list_subscribers(&self) -> UseCaseResult<Vec<SubscriberDto>> {
        let subscribers = self
            .subscription_repo
            .list_subscribers()
            .await
            .map_err(|err| internal("subscribers", err))?;
        Ok(subscribers.into_iter().map(SubscriberDto::from).collect())
    }
}

fn internal(what: &'static str, err: anyhow::Error) -> AdminError {
    error!(what, db_error = ?err, "admin: failed to load dashboard data");
    AdminError::Internal(err)
}
