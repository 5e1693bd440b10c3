use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

// Root configuration, one section per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    /// How many times startup retries the first connection before giving up.
    pub connect_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub bcrypt_cost: u32,
}

// Staff account created at startup when ADMIN_EMAIL is present
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let admin = match env::var("ADMIN_EMAIL") {
            Ok(email) => Some(AdminConfig {
                email,
                password: required("ADMIN_PASSWORD")?,
            }),
            Err(_) => None,
        };

        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parsed("PORT", 8000)?,
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "theatre_api=debug,tower_http=debug".to_string()),
                log_json: env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parsed("DB_POOL_SIZE", 20)?,
                connect_attempts: parsed("DB_CONNECT_ATTEMPTS", 10)?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                access_ttl_minutes: parsed("JWT_ACCESS_TTL_MINUTES", 60)?,
                refresh_ttl_hours: parsed("JWT_REFRESH_TTL_HOURS", 24)?,
            },
            password: PasswordConfig {
                bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            },
            admin,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
