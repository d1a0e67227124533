pub mod account;
pub mod auth;
pub mod dashboard;
pub mod enums;
pub mod storage;
pub mod subscriptions;
pub mod taxonomy;
pub mod videos;
