//! Configuration module for tradebook-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct TradebookConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl TradebookConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "tradebook-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
        })
    }
}
