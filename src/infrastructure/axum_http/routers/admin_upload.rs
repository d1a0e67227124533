use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::warn;

use crate::{
    application::usecases::admin::uploads::{MAX_UPLOAD_BYTES, UploadUseCase},
    domain::{
        repositories::storage::ObjectStorage,
        value_objects::{storage::UploadFile, videos::SuccessResponse},
    },
    infrastructure::{
        axum_http::{auth::AdminUser, error_responses::AppError},
        supabase::storage_client::SupabaseStorageClient,
    },
};

/// Room for the multipart framing and the text fields around the file part.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn routes(storage: Arc<SupabaseStorageClient>) -> Router {
    router(Arc::new(UploadUseCase::new(storage)))
}

pub fn router<O>(upload_usecase: Arc<UploadUseCase<O>>) -> Router
where
    O: ObjectStorage + Send + Sync + 'static,
{
    limited_router(upload_usecase, MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)
}

fn limited_router<O>(upload_usecase: Arc<UploadUseCase<O>>, body_limit: usize) -> Router
where
    O: ObjectStorage + Send + Sync + 'static,
{
    Router::new()
        .route("/upload", post(upload).delete(remove))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(upload_usecase)
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    pub bucket: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadFile>,
    bucket: Option<String>,
    path: Option<String>,
}

fn form_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(multipart_error = %err, "admin: upload exceeds body limit");
        return AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File size exceeds {}MB limit", MAX_UPLOAD_BYTES / 1024 / 1024),
        );
    }

    warn!(multipart_error = %err, "admin: malformed upload body");
    AppError::bad_request("Invalid form data")
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&file_name)
                            .first_or_octet_stream()
                            .to_string()
                    });
                let bytes = field.bytes().await.map_err(form_error)?;
                form.file = Some(UploadFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "bucket" | "path" => {
                let value = field.text().await.map_err(form_error)?;
                if name == "bucket" {
                    form.bucket = Some(value);
                } else {
                    form.path = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

pub async fn upload<O>(
    State(upload_usecase): State<Arc<UploadUseCase<O>>>,
    _admin: AdminUser,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    O: ObjectStorage + Send + Sync + 'static,
{
    let form = read_form(multipart).await?;
    let uploaded = upload_usecase
        .upload(form.file, form.bucket, form.path)
        .await?;
    Ok(Json(uploaded))
}

pub async fn remove<O>(
    State(upload_usecase): State<Arc<UploadUseCase<O>>>,
    _admin: AdminUser,
    WithRejection(Query(query), _): WithRejection<Query<RemoveQuery>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    O: ObjectStorage + Send + Sync + 'static,
{
    upload_usecase.remove(query.bucket, query.path).await?;
    Ok(Json(SuccessResponse { success: true }))
}
