use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::{AdminError, UseCaseResult};
use crate::domain::{
    repositories::storage::ObjectStorage,
    value_objects::{
        enums::storage_buckets::StorageBucket,
        storage::{UploadFile, UploadedObjectDto},
    },
};

pub const MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

pub struct UploadUseCase<O>
where
    O: ObjectStorage + Send + Sync + 'static,
{
    storage: Arc<O>,
}

impl<O> UploadUseCase<O>
where
    O: ObjectStorage + Send + Sync + 'static,
{
    pub fn new(storage: Arc<O>) -> Self {
        Self { storage }
    }

    pub async fn upload(
        &self,
        file: Option<UploadFile>,
        bucket: Option<String>,
        path: Option<String>,
    ) -> UseCaseResult<UploadedObjectDto> {
        let file = file.ok_or_else(|| AdminError::Validation("No file provided".to_string()))?;
        let bucket = bucket
            .as_deref()
            .and_then(StorageBucket::parse)
            .ok_or_else(|| AdminError::Validation("Invalid bucket".to_string()))?;

        validate_file(bucket, &file)?;

        let path = match path.map(|path| path.trim().to_string()) {
            Some(path) if !path.is_empty() => {
                if !is_safe_object_path(&path) {
                    return Err(AdminError::Validation("Invalid path".to_string()));
                }
                path
            }
            _ => default_object_path(Utc::now().timestamp_millis(), &file.file_name),
        };

        let size_bytes = file.bytes.len();
        info!(%bucket, %path, size_bytes, content_type = %file.content_type, "admin: uploading media");

        let stored_path = self
            .storage
            .upload(bucket, &path, file.bytes, &file.content_type)
            .await
            .map_err(|err| {
                error!(%bucket, %path, storage_error = ?err, "admin: upload failed");
                AdminError::Internal(err)
            })?;

        let url = self.storage.public_url(bucket, &stored_path);
        info!(%bucket, path = %stored_path, "admin: media uploaded");

        Ok(UploadedObjectDto {
            path: stored_path,
            url,
        })
    }

    pub async fn remove(&self, bucket: Option<String>, path: Option<String>) -> UseCaseResult<()> {
        let bucket = bucket
            .as_deref()
            .and_then(StorageBucket::parse)
            .ok_or_else(|| AdminError::Validation("Invalid bucket".to_string()))?;
        let path = path
            .map(|path| path.trim().to_string())
            .filter(|path| is_safe_object_path(path))
            .ok_or_else(|| AdminError::Validation("Invalid path".to_string()))?;

        self.storage.delete(bucket, &path).await.map_err(|err| {
            error!(%bucket, %path, storage_error = ?err, "admin: media delete failed");
            AdminError::Internal(err)
        })?;

        info!(%bucket, %path, "admin: media deleted");
        Ok(())
    }
}

fn validate_file(bucket: StorageBucket, file: &UploadFile) -> UseCaseResult<()> {
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        warn!(%bucket, size_bytes = file.bytes.len(), "admin: upload too large");
        return Err(AdminError::Validation(format!(
            "File size exceeds {}MB limit",
            MAX_UPLOAD_BYTES / 1024 / 1024
        )));
    }

    if !bucket.accepts(&file.content_type) {
        let kind = match bucket {
            StorageBucket::Thumbnails => "image",
            StorageBucket::Videos | StorageBucket::Previews => "video",
        };
        return Err(AdminError::Validation(format!(
            "Invalid {} type. Allowed: {}",
            kind,
            bucket.allowed_content_types().join(", ")
        )));
    }

    Ok(())
}

/// `<epoch_ms>-<name>` with every character outside `[a-zA-Z0-9.-]` replaced by `_`.
pub fn default_object_path(epoch_millis: i64, file_name: &str) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}", epoch_millis, safe_name)
}

fn is_safe_object_path(path: &str) -> bool {
    !path.starts_with('/')
        && !path.contains('\\')
        && path.split('/').all(|segment| !segment.is_empty() && segment != "..")
}
