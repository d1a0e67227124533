use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;

use crate::{
    application::usecases::admin::dashboard::DashboardUseCase,
    domain::repositories::{
        subscriptions::SubscriptionRepository, video_views::VideoViewRepository,
        videos::VideoRepository,
    },
    infrastructure::{
        axum_http::{auth::AdminUser, error_responses::AppError},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                subscriptions::SubscriptionPostgres, video_views::VideoViewPostgres,
                videos::VideoPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, monthly_price_minor: i64) -> Router {
    let dashboard_usecase = DashboardUseCase::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(VideoPostgres::new(Arc::clone(&db_pool))),
        Arc::new(VideoViewPostgres::new(Arc::clone(&db_pool))),
        monthly_price_minor,
    );

    router(Arc::new(dashboard_usecase))
}

pub fn router<S, V, W>(dashboard_usecase: Arc<DashboardUseCase<S, V, W>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/subscribers", get(list_subscribers))
        .with_state(dashboard_usecase)
}

pub async fn dashboard<S, V, W>(
    State(dashboard_usecase): State<Arc<DashboardUseCase<S, V, W>>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
{
    let dashboard = dashboard_usecase.dashboard().await?;
    Ok(Json(dashboard))
}

pub async fn list_subscribers<S, V, W>(
    State(dashboard_usecase): State<Arc<DashboardUseCase<S, V, W>>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
{
    let subscribers = dashboard_usecase.list_subscribers().await?;
    Ok(Json(json!({ "subscribers": subscribers })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            repositories::{
                subscriptions::MockSubscriptionRepository, video_views::MockVideoViewRepository,
                videos::MockVideoRepository,
            },
            value_objects::enums::roles::Role,
        },
        infrastructure::axum_http::test_support::{auth_state, bearer_for, json_body},
    };
    use axum::{
        Extension,
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn dashboard_returns_counts_for_admin() {
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions.expect_count_active().returning(|_| Ok(3));
        let mut videos = MockVideoRepository::new();
        videos.expect_count_videos().returning(|| Ok(10));
        videos.expect_count_published_videos().returning(|| Ok(8));
        let mut views = MockVideoViewRepository::new();
        views.expect_count_views().returning(|| Ok(77));

        let usecase = DashboardUseCase::new(
            Arc::new(subscriptions),
            Arc::new(videos),
            Arc::new(views),
            1500,
        );
        let app = Router::new()
            .nest("/api/admin", router(Arc::new(usecase)))
            .layer(Extension(auth_state(Role::Admin, None)));

        let response = app
            .oneshot(
                Request::get("/api/admin/dashboard")
                    .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["active_subscribers"], 3);
        assert_eq!(body["estimated_mrr_minor"], 4500);
        assert_eq!(body["total_views"], 77);
    }

    #[tokio::test]
    async fn anonymous_request_is_unauthorized() {
        let usecase = DashboardUseCase::new(
            Arc::new(MockSubscriptionRepository::new()),
            Arc::new(MockVideoRepository::new()),
            Arc::new(MockVideoViewRepository::new()),
            1500,
        );
        let app = Router::new()
            .nest("/api/admin", router(Arc::new(usecase)))
            .layer(Extension(auth_state(Role::Admin, None)));

        let response = app
            .oneshot(
                Request::get("/api/admin/subscribers")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
