use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use mockall::automock;

use crate::domain::value_objects::enums::storage_buckets::StorageBucket;

#[automock]
#[async_trait]
pub trait ObjectStorage {
    /// Upserts the object and returns its key inside the bucket.
    async fn upload(
        &self,
        bucket: StorageBucket,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String>;

    async fn delete(&self, bucket: StorageBucket, path: &str) -> Result<()>;

    async fn signed_url(&self, bucket: StorageBucket, path: &str, expires_in: u64)
    -> Result<String>;

    fn public_url(&self, bucket: StorageBucket, path: &str) -> String;
}
