pub mod access;
pub mod account;
pub mod admin;
pub mod auth;
pub mod billing;
pub mod catalog;
