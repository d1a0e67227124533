use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::usecases::admin::videos::AdminVideoUseCase,
    domain::{
        repositories::videos::VideoRepository,
        value_objects::videos::{AdminVideoModel, AdminVideoResponse, SuccessResponse},
    },
    infrastructure::{
        axum_http::{auth::AdminUser, error_responses::AppError},
        postgres::{postgres_connection::PgPoolSquad, repositories::videos::VideoPostgres},
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let video_repository = VideoPostgres::new(Arc::clone(&db_pool));
    let admin_video_usecase = AdminVideoUseCase::new(Arc::new(video_repository));

    router(Arc::new(admin_video_usecase))
}

pub fn router<V>(admin_video_usecase: Arc<AdminVideoUseCase<V>>) -> Router
where
    V: VideoRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/videos", get(list_videos).post(create_video))
        .route(
            "/videos/:id",
            get(get_video).put(update_video).delete(delete_video),
        )
        .with_state(admin_video_usecase)
}

pub async fn list_videos<V>(
    State(admin_video_usecase): State<Arc<AdminVideoUseCase<V>>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
{
    let videos = admin_video_usecase.list_videos().await?;
    Ok(Json(json!({ "videos": videos })))
}

pub async fn get_video<V>(
    State(admin_video_usecase): State<Arc<AdminVideoUseCase<V>>>,
    _admin: AdminUser,
    WithRejection(Path(video_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
{
    let video = admin_video_usecase.get_video(video_id).await?;
    Ok(Json(AdminVideoResponse { video }))
}

pub async fn create_video<V>(
    State(admin_video_usecase): State<Arc<AdminVideoUseCase<V>>>,
    _admin: AdminUser,
    WithRejection(Json(admin_video_model), _): WithRejection<Json<AdminVideoModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
{
    let video = admin_video_usecase.create_video(admin_video_model).await?;
    Ok(Json(AdminVideoResponse { video }))
}

pub async fn update_video<V>(
    State(admin_video_usecase): State<Arc<AdminVideoUseCase<V>>>,
    _admin: AdminUser,
    WithRejection(Path(video_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(admin_video_model), _): WithRejection<Json<AdminVideoModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
{
    admin_video_usecase
        .update_video(video_id, admin_video_model)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn delete_video<V>(
    State(admin_video_usecase): State<Arc<AdminVideoUseCase<V>>>,
    _admin: AdminUser,
    WithRejection(Path(video_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
{
    admin_video_usecase.delete_video(video_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{repositories::videos::MockVideoRepository, value_objects::enums::roles::Role},
        infrastructure::axum_http::test_support::{auth_state, bearer_for, json_body},
    };
    use axum::{
        Extension,
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
    };
    use tower::ServiceExt;

    fn app(videos: MockVideoRepository, role: Role) -> Router {
        Router::new()
            .nest(
                "/api/admin",
                router(Arc::new(AdminVideoUseCase::new(Arc::new(videos)))),
            )
            .layer(Extension(auth_state(role, None)))
    }

    #[tokio::test]
    async fn members_cannot_manage_videos() {
        let mut videos = MockVideoRepository::new();
        videos.expect_list_all().never();

        let response = app(videos, Role::Member)
            .oneshot(
                Request::get("/api/admin/videos")
                    .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["redirect_to"], "/");
    }

    #[tokio::test]
    async fn update_answers_success() {
        let video_id = Uuid::new_v4();
        let mut videos = MockVideoRepository::new();
        videos
            .expect_update_video()
            .withf(move |id, edit, _, _| *id == video_id && edit.slug == "kizomba-flow")
            .times(1)
            .returning(|_, _, _, _| Ok(true));

        let response = app(videos, Role::Admin)
            .oneshot(
                Request::put(format!("/api/admin/videos/{}", video_id))
                    .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"title":"Kizomba Flow","slug":"kizomba-flow","published":true,"video_path":""}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
    }

    #[tokio::test]
    async fn malformed_video_id_and_body_answer_json() {
        let mut videos = MockVideoRepository::new();
        videos.expect_find_by_id().never();
        videos.expect_create_video().never();
        let app = app(videos, Role::Admin);

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/admin/videos/not-a-uuid")
                    .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], 400);

        let response = app
            .oneshot(
                Request::post("/api/admin/videos")
                    .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title":"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], 400);
    }

    #[tokio::test]
    async fn deleting_missing_video_is_not_found() {
        let mut videos = MockVideoRepository::new();
        videos.expect_delete_video().returning(|_| Ok(false));

        let response = app(videos, Role::Admin)
            .oneshot(
                Request::delete(format!("/api/admin/videos/{}", Uuid::new_v4()))
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
