use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;

use crate::{
    application::usecases::catalog::{CatalogError, CatalogUseCase},
    domain::{
        repositories::{
            levels::LevelRepository, storage::ObjectStorage, styles::StyleRepository,
            video_views::VideoViewRepository, videos::VideoRepository,
        },
        value_objects::videos::{VideoListQuery, VideoListResponse},
    },
    infrastructure::{
        axum_http::{
            auth::{AuthState, AuthUser},
            error_responses::AppError,
        },
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                levels::LevelPostgres, styles::StylePostgres, video_views::VideoViewPostgres,
                videos::VideoPostgres,
            },
        },
        supabase::storage_client::SupabaseStorageClient,
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    storage: Arc<SupabaseStorageClient>,
    signed_url_ttl_seconds: u64,
) -> Router {
    let catalog_usecase = CatalogUseCase::new(
        Arc::new(VideoPostgres::new(Arc::clone(&db_pool))),
        Arc::new(VideoViewPostgres::new(Arc::clone(&db_pool))),
        Arc::new(StylePostgres::new(Arc::clone(&db_pool))),
        Arc::new(LevelPostgres::new(Arc::clone(&db_pool))),
        storage,
        signed_url_ttl_seconds,
    );

    router(Arc::new(catalog_usecase))
}

pub fn router<V, W, S, L, O>(catalog_usecase: Arc<CatalogUseCase<V, W, S, L, O>>) -> Router
where
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    Router::new()
        .route("/videos", get(list_videos))
        .route("/videos/taxonomy", get(taxonomy))
        .route("/videos/:slug", get(video_detail))
        .route("/search", get(search))
        .with_state(catalog_usecase)
}

pub async fn list_videos<V, W, S, L, O>(
    State(catalog_usecase): State<Arc<CatalogUseCase<V, W, S, L, O>>>,
    _user: AuthUser,
    WithRejection(Query(video_list_query), _): WithRejection<Query<VideoListQuery>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    let filter = video_list_query
        .into_filter()
        .map_err(CatalogError::InvalidFilter)?;
    let videos = catalog_usecase.list_videos(filter).await?;
    Ok(Json(VideoListResponse { videos }))
}

pub async fn search<V, W, S, L, O>(
    State(catalog_usecase): State<Arc<CatalogUseCase<V, W, S, L, O>>>,
    _user: AuthUser,
    WithRejection(Query(video_list_query), _): WithRejection<Query<VideoListQuery>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    let filter = video_list_query
        .into_filter()
        .map_err(CatalogError::InvalidFilter)?;
    let videos = catalog_usecase.search(filter).await?;
    Ok(Json(VideoListResponse { videos }))
}

pub async fn taxonomy<V, W, S, L, O>(
    State(catalog_usecase): State<Arc<CatalogUseCase<V, W, S, L, O>>>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    Ok(Json(catalog_usecase.taxonomy().await?))
}

pub async fn video_detail<V, W, S, L, O>(
    State(catalog_usecase): State<Arc<CatalogUseCase<V, W, S, L, O>>>,
    Extension(auth_state): Extension<Arc<AuthState>>,
    user: AuthUser,
    WithRejection(Path(slug), _): WithRejection<Path<String>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    W: VideoViewRepository + Send + Sync + 'static,
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    let entitlement = auth_state.access_gate.entitlement(&user.session).await?;
    let video = catalog_usecase
        .video_detail(&slug, &user.session, entitlement)
        .await?;
    Ok(Json(video))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            entities::{subscriptions::SubscriptionEntity, videos::VideoEntity},
            repositories::{
                levels::MockLevelRepository, storage::MockObjectStorage,
                styles::MockStyleRepository, video_views::MockVideoViewRepository,
                videos::MockVideoRepository,
            },
            value_objects::{enums::roles::Role, enums::video_sorts::VideoSort},
        },
        infrastructure::axum_http::test_support::{auth_state, bearer_for, json_body},
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn video(slug: &str) -> VideoEntity {
        VideoEntity {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: "Salsa Basics".to_string(),
            description: None,
            duration_seconds: Some(754),
            teacher: None,
            published: true,
            video_path: Some("salsa/basics.mp4".to_string()),
            preview_path: Some("salsa/basics-preview.mp4".to_string()),
            thumbnail_path: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn app(
        videos: MockVideoRepository,
        views: MockVideoViewRepository,
        storage: MockObjectStorage,
        state: Arc<AuthState>,
    ) -> Router {
        let usecase = CatalogUseCase::new(
            Arc::new(videos),
            Arc::new(views),
            Arc::new(MockStyleRepository::new()),
            Arc::new(MockLevelRepository::new()),
            Arc::new(storage),
            600,
        );
        Router::new()
            .nest("/api", router(Arc::new(usecase)))
            .layer(Extension(state))
    }

    #[tokio::test]
    async fn library_requires_a_session() {
        let response = app(
            MockVideoRepository::new(),
            MockVideoViewRepository::new(),
            MockObjectStorage::new(),
            auth_state(Role::Member, None),
        )
        .oneshot(Request::get("/api/videos").body(Body::empty()).unwrap())
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["redirect_to"], "/signin?next=%2Fapi%2Fvideos");
    }

    #[tokio::test]
    async fn library_passes_query_filters() {
        let mut videos = MockVideoRepository::new();
        videos
            .expect_list_published()
            .withf(|filter| {
                filter.sort == VideoSort::Popular
                    && filter.limit == 100
                    && filter.search.as_deref() == Some("salsa")
            })
            .returning(|_| Ok(vec![video("salsa-basics")]));
        videos.expect_styles_for_videos().returning(|_| Ok(vec![]));
        videos.expect_levels_for_videos().returning(|_| Ok(vec![]));

        let response = app(
            videos,
            MockVideoViewRepository::new(),
            MockObjectStorage::new(),
            auth_state(Role::Member, None),
        )
        .oneshot(
            Request::get("/api/videos?q=%20salsa%20&sort=popular&limit=500")
                .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["videos"][0]["slug"], "salsa-basics");
        assert_eq!(body["videos"][0]["duration"], "12:34");
    }

    #[tokio::test]
    async fn blank_style_and_level_mean_no_filter() {
        let mut videos = MockVideoRepository::new();
        videos
            .expect_list_published()
            .withf(|filter| filter.style_id.is_none() && filter.level_id.is_none())
            .times(1)
            .returning(|_| Ok(vec![]));
        videos.expect_styles_for_videos().returning(|_| Ok(vec![]));
        videos.expect_levels_for_videos().returning(|_| Ok(vec![]));

        let response = app(
            videos,
            MockVideoViewRepository::new(),
            MockObjectStorage::new(),
            auth_state(Role::Member, None),
        )
        .oneshot(
            Request::get("/api/videos?style=&level=")
                .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_query_answers_json_bad_request() {
        for (uri, message) in [
            ("/api/videos?style=salsa", Some("Invalid style id")),
            ("/api/videos?limit=many", None),
        ] {
            let mut videos = MockVideoRepository::new();
            videos.expect_list_published().never();

            let response = app(
                videos,
                MockVideoViewRepository::new(),
                MockObjectStorage::new(),
                auth_state(Role::Member, None),
            )
            .oneshot(
                Request::get(uri)
                    .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body = json_body(response).await;
            assert_eq!(body["code"], 400);
            if let Some(message) = message {
                assert_eq!(body["message"], message);
            }
        }
    }

    #[tokio::test]
    async fn subscriber_gets_full_video_url() {
        let user_id = Uuid::new_v4();
        let mut videos = MockVideoRepository::new();
        videos
            .expect_find_published_by_slug()
            .returning(|slug| Ok(Some(video(slug))));
        videos.expect_styles_for_videos().returning(|_| Ok(vec![]));
        videos.expect_levels_for_videos().returning(|_| Ok(vec![]));
        let mut views = MockVideoViewRepository::new();
        views.expect_record_view().times(1).returning(|_| Ok(()));
        let mut storage = MockObjectStorage::new();
        storage
            .expect_signed_url()
            .returning(|bucket, path, _| Ok(format!("https://signed.test/{}/{}", bucket, path)));

        let subscription = SubscriptionEntity {
            user_id,
            stripe_customer_id: Some("cus_1".to_string()),
            stripe_subscription_id: Some("sub_1".to_string()),
            status: "active".to_string(),
            price_id: Some("price_monthly".to_string()),
            current_period_end: Some(Utc::now() + Duration::days(10)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = app(
            videos,
            views,
            storage,
            auth_state(Role::Member, Some(subscription)),
        )
        .oneshot(
            Request::get("/api/videos/salsa-basics")
                .header(AUTHORIZATION, bearer_for(user_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["playback"]["has_subscription"], true);
        assert_eq!(
            body["playback"]["video_url"],
            "https://signed.test/videos/salsa/basics.mp4"
        );
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let mut videos = MockVideoRepository::new();
        videos.expect_find_published_by_slug().returning(|_| Ok(None));

        let response = app(
            videos,
            MockVideoViewRepository::new(),
            MockObjectStorage::new(),
            auth_state(Role::Member, None),
        )
        .oneshot(
            Request::get("/api/videos/missing")
                .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Video not found");
    }
}
