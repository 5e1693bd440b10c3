use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    /// Connects, retrying while the database is still coming up. Gives up
    /// after `connect_attempts` tries.
    pub async fn wait_for(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let mut attempt = 1;
        loop {
            match Self::connect(config).await {
                Ok(db) => return Ok(db),
                Err(e) if attempt < config.connect_attempts => {
                    warn!("Database unavailable (attempt {}/{}): {}", attempt, config.connect_attempts, e);
                    attempt += 1;
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Schema is up to date");
        Ok(())
    }
}
