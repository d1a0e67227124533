pub mod auth_events;
pub mod levels;
pub mod profiles;
pub mod styles;
pub mod subscriptions;
pub mod video_views;
pub mod videos;
