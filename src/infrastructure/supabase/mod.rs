pub mod auth_client;
pub mod s3;
pub mod storage_client;
