//! Runtime settings, read once at startup from the process environment
//! (and `.env` when present)

use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

use crate::models::PaginationSettings;

const DEVELOPMENT_JWT_SECRET: &str = "development-secret-change-in-production";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("{key} has an invalid value: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Deployment environment. Production refuses the built-in JWT secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidValue {
                key: "ENVIRONMENT",
                reason: format!("'{}' is not one of dev, staging, prod", other),
            }),
        }
    }
}

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub environment: Environment,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,

    /// Comma separated; unset means any origin
    pub cors_allowed_origins: Option<String>,

    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,

    pub jwt_secret: String,
    pub jwt_access_token_ttl_seconds: i64,
    pub jwt_refresh_token_ttl_days: i64,

    /// Page size used when a list request does not ask for one
    pub default_page_size: u32,

    /// Upper bound on the page size a client may request
    pub max_page_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = match env::var("ENVIRONMENT") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL"))?;

        let host: IpAddr = parse_required("HOST", "127.0.0.1")?;
        let port: u16 = parse_required("PORT", "3001")?;

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        // Production must not fall back to the development secret
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET"))
            }
            _ => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        let jwt_access_token_ttl_seconds = parse_or("JWT_ACCESS_TOKEN_TTL_SECONDS", 900);
        let jwt_refresh_token_ttl_days = parse_or("JWT_REFRESH_TOKEN_TTL_DAYS", 7);

        let max_page_size = parse_or("MAX_PAGE_SIZE", 100u32).max(1);
        let default_page_size = parse_or("DEFAULT_PAGE_SIZE", 10u32).clamp(1, max_page_size);

        Ok(Config {
            database_url,
            environment,
            host,
            port,
            db_max_connections,
            cors_allowed_origins,
            log_level,
            jwt_secret,
            jwt_access_token_ttl_seconds,
            jwt_refresh_token_ttl_days,
            default_page_size,
            max_page_size,
        })
    }

    /// Page size limits for list endpoints
    pub fn pagination(&self) -> PaginationSettings {
        PaginationSettings {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }

    /// Database URL with the password replaced, for logs
    pub fn database_url_masked(&self) -> String {
        let url = &self.database_url;
        let Some(at) = url.find('@') else {
            return url.clone();
        };
        let credentials_start = url.find("://").map(|i| i + 3).unwrap_or(0);
        match url[credentials_start..at].find(':') {
            Some(colon) => {
                let colon = credentials_start + colon;
                format!("{}****{}", &url[..=colon], &url[at..])
            }
            None => url.clone(),
        }
    }
}

/// Parse a variable that must be well-formed when present
fn parse_required<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        reason: format!("cannot parse '{}'", raw),
    })
}

/// Lenient numeric knobs: anything unparsable keeps the default
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
