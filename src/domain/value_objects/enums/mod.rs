pub mod auth_event_kinds;
pub mod roles;
pub mod storage_buckets;
pub mod subscription_statuses;
pub mod video_sorts;
