use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream};
use bytes::Bytes;
use tracing::debug;

use crate::domain::{
    repositories::storage::ObjectStorage, value_objects::enums::storage_buckets::StorageBucket,
};

use super::s3::{S3Config, build_s3_client, describe_sdk_error};

#[derive(Debug, Clone)]
pub struct SupabaseStorageConfig {
    pub project_url: String,
    pub s3_endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Media buckets on Supabase Storage, reached through its S3-compatible API.
/// https://supabase.com/docs/guides/storage/s3/compatibility
pub struct SupabaseStorageClient {
    client: aws_sdk_s3::Client,
    public_base: String,
}

impl SupabaseStorageClient {
    pub async fn new(config: SupabaseStorageConfig) -> Result<Self> {
        let client = build_s3_client(&S3Config::new(
            config.s3_endpoint,
            config.region,
            config.access_key,
            config.secret_key,
        ))
        .await
        .context("failed to build Supabase s3 client")?;

        Ok(Self {
            client,
            public_base: public_base(&config.project_url),
        })
    }
}

fn public_base(project_url: &str) -> String {
    format!(
        "{}/storage/v1/object/public",
        project_url.trim_end_matches('/')
    )
}

fn public_object_url(public_base: &str, bucket: StorageBucket, path: &str) -> String {
    format!(
        "{}/{}/{}",
        public_base,
        bucket.as_str(),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl ObjectStorage for SupabaseStorageClient {
    async fn upload(
        &self,
        bucket: StorageBucket,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String> {
        self.client
            .put_object()
            .bucket(bucket.as_str())
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| {
                describe_sdk_error(err, "upload to Supabase Storage", bucket.as_str(), path)
            })?;

        Ok(path.to_string())
    }

    async fn delete(&self, bucket: StorageBucket, path: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket.as_str())
            .key(path)
            .send()
            .await
            .map_err(|err| {
                describe_sdk_error(
                    err,
                    "delete Supabase Storage object",
                    bucket.as_str(),
                    path,
                )
            })?;

        Ok(())
    }

    async fn signed_url(
        &self,
        bucket: StorageBucket,
        path: &str,
        expires_in: u64,
    ) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_in))
            .context("invalid signed url lifetime")?;
        let request = self
            .client
            .get_object()
            .bucket(bucket.as_str())
            .key(path)
            .presigned(presigning)
            .await
            .map_err(|err| {
                describe_sdk_error(err, "sign Supabase Storage url", bucket.as_str(), path)
            })?;

        debug!(%bucket, %path, expires_in, "signed storage url issued");
        Ok(request.uri().to_string())
    }

    fn public_url(&self, bucket: StorageBucket, path: &str) -> String {
        public_object_url(&self.public_base, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_points_at_public_object_route() {
        let base = public_base("https://project.supabase.test/");
        assert_eq!(
            public_object_url(&base, StorageBucket::Thumbnails, "/classes/salsa.png"),
            "https://project.supabase.test/storage/v1/object/public/thumbnails/classes/salsa.png"
        );
    }
}
