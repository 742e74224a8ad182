use crate::error::Result;
use alleleload_common::LoadError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl DbConfig {
    pub fn from_env() -> alleleload_common::Result<Self> {
        let url = std::env::var("DATABASE_URL").map_err(|_| LoadError::missing_var("DATABASE_URL"))?;

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let connect_timeout_secs = std::env::var("DB_CONNECT_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        Ok(Self {
            url,
            max_connections,
            connect_timeout_secs,
        })
    }

    pub fn validate(&self) -> alleleload_common::Result<()> {
        if self.url.is_empty() {
            return Err(LoadError::config("DATABASE_URL cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(LoadError::config("DB_MAX_CONNECTIONS must be greater than 0"));
        }
        Ok(())
    }

    /// `host/database` for logging, without credentials
    pub fn describe(&self) -> String {
        match PgConnectOptions::from_str(&self.url) {
            Ok(options) => format!(
                "{}/{}",
                options.get_host(),
                options.get_database().unwrap_or_default()
            ),
            Err(_) => "<unparseable database url>".to_string(),
        }
    }
}

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        database = %config.describe(),
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}
