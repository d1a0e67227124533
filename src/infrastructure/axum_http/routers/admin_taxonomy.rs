use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::usecases::admin::taxonomy::AdminTaxonomyUseCase,
    domain::{
        repositories::{levels::LevelRepository, styles::StyleRepository},
        value_objects::{
            taxonomy::{LevelModel, LevelResponse, StyleModel, StyleResponse},
            videos::SuccessResponse,
        },
    },
    infrastructure::{
        axum_http::{auth::AdminUser, error_responses::AppError},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{levels::LevelPostgres, styles::StylePostgres},
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let admin_taxonomy_usecase = AdminTaxonomyUseCase::new(
        Arc::new(StylePostgres::new(Arc::clone(&db_pool))),
        Arc::new(LevelPostgres::new(Arc::clone(&db_pool))),
    );

    router(Arc::new(admin_taxonomy_usecase))
}

pub fn router<S, L>(admin_taxonomy_usecase: Arc<AdminTaxonomyUseCase<S, L>>) -> Router
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/styles", get(list_styles).post(create_style))
        .route("/styles/:id", put(update_style).delete(delete_style))
        .route("/levels", get(list_levels).post(create_level))
        .route("/levels/:id", put(update_level).delete(delete_level))
        .route("/seed", post(seed))
        .with_state(admin_taxonomy_usecase)
}

pub async fn list_styles<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    let styles = admin_taxonomy_usecase.list_styles().await?;
    Ok(Json(json!({ "styles": styles })))
}

pub async fn create_style<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
    WithRejection(Json(style_model), _): WithRejection<Json<StyleModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    let style = admin_taxonomy_usecase.create_style(style_model).await?;
    Ok(Json(StyleResponse { style }))
}

pub async fn update_style<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
    WithRejection(Path(style_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(style_model), _): WithRejection<Json<StyleModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    let style = admin_taxonomy_usecase
        .update_style(style_id, style_model)
        .await?;
    Ok(Json(StyleResponse { style }))
}

pub async fn delete_style<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
    WithRejection(Path(style_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    admin_taxonomy_usecase.delete_style(style_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn list_levels<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    let levels = admin_taxonomy_usecase.list_levels().await?;
    Ok(Json(json!({ "levels": levels })))
}

pub async fn create_level<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
    WithRejection(Json(level_model), _): WithRejection<Json<LevelModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    let level = admin_taxonomy_usecase.create_level(level_model).await?;
    Ok(Json(LevelResponse { level }))
}

pub async fn update_level<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
    WithRejection(Path(level_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(level_model), _): WithRejection<Json<LevelModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    let level = admin_taxonomy_usecase
        .update_level(level_id, level_model)
        .await?;
    Ok(Json(LevelResponse { level }))
}

pub async fn delete_level<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
    WithRejection(Path(level_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    admin_taxonomy_usecase.delete_level(level_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn seed<S, L>(
    State(admin_taxonomy_usecase): State<Arc<AdminTaxonomyUseCase<S, L>>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    let seeded = admin_taxonomy_usecase.seed_defaults().await?;
    Ok(Json(seeded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            entities::styles::StyleEntity,
            repositories::{levels::MockLevelRepository, styles::MockStyleRepository},
            value_objects::enums::roles::Role,
        },
        infrastructure::axum_http::test_support::{auth_state, bearer_for, json_body},
    };
    use axum::{
        Extension,
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
    };
    use chrono::Utc;
    use tower::ServiceExt;

    fn app(styles: MockStyleRepository, levels: MockLevelRepository) -> Router {
        Router::new()
            .nest(
                "/api/admin",
                router(Arc::new(AdminTaxonomyUseCase::new(
                    Arc::new(styles),
                    Arc::new(levels),
                ))),
            )
            .layer(Extension(auth_state(Role::Admin, None)))
    }

    #[tokio::test]
    async fn create_style_wraps_result() {
        let mut styles = MockStyleRepository::new();
        styles.expect_create_style().returning(|name, slug| {
            Ok(StyleEntity {
                id: Uuid::new_v4(),
                name,
                slug,
                position: 4,
                created_at: Utc::now(),
            })
        });

        let response = app(styles, MockLevelRepository::new())
            .oneshot(
                Request::post("/api/admin/styles")
                    .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Zouk"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["style"]["slug"], "zouk");
    }

    #[tokio::test]
    async fn level_without_name_is_bad_request() {
        let response = app(MockStyleRepository::new(), MockLevelRepository::new())
            .oneshot(
                Request::post("/api/admin/levels")
                    .header(AUTHORIZATION, bearer_for(Uuid::new_v4()))
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Name is required");
    }
}
