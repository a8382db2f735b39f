pub mod repository;

pub mod config;
pub use config::{AppConfigImpl, AuthSettings, DatabaseConfig, LogConfig, ServerConfig};

pub mod auth;

pub mod db;
