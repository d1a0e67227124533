pub mod access;
pub mod account;
pub mod admin_dashboard;
pub mod admin_taxonomy;
pub mod admin_upload;
pub mod admin_videos;
pub mod auth;
pub mod billing;
pub mod videos;
