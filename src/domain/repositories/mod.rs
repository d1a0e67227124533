pub mod auth_events;
pub mod auth_provider;
pub mod levels;
pub mod payment_gateway;
pub mod profiles;
pub mod storage;
pub mod styles;
pub mod subscriptions;
pub mod video_views;
pub mod videos;
