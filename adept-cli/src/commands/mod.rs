pub mod auth;
pub mod config;
pub mod interview;
pub mod profile;
pub mod sessions;
