//! Configuration management for Client Service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! Settings are loaded once at startup and read-only thereafter.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub email: EmailSettings,
    pub storage: StorageSettings,
    pub cookies: CookieSettings,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            server: ServerSettings::from_env()?,
            database: DatabaseSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            email: EmailSettings::from_env()?,
            storage: StorageSettings::from_env(),
            cookies: CookieSettings::from_env(),
        })
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: String,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }
}

/// MongoDB connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub uri: String,
    pub database: String,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            uri: env::var("MONGODB_URI").context("MONGODB_URI must be set")?,
            database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "clientbase".to_string()),
        })
    }
}

/// JWT signing settings
///
/// Access, refresh, and email-verification tokens each carry their own
/// secret and lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    pub access_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_secret: String,
    pub refresh_ttl_secs: i64,
    pub verification_secret: String,
    pub verification_ttl_secs: i64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            access_secret: env::var("ACCESS_TOKEN_SECRET")
                .context("ACCESS_TOKEN_SECRET must be set")?,
            access_ttl_secs: env::var("ACCESS_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("Invalid ACCESS_TOKEN_TTL_SECS")?,
            refresh_secret: env::var("REFRESH_TOKEN_SECRET")
                .context("REFRESH_TOKEN_SECRET must be set")?,
            refresh_ttl_secs: env::var("REFRESH_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "2592000".to_string())
                .parse()
                .context("Invalid REFRESH_TOKEN_TTL_SECS")?,
            verification_secret: env::var("EMAIL_VERIFICATION_SECRET")
                .context("EMAIL_VERIFICATION_SECRET must be set")?,
            verification_ttl_secs: env::var("EMAIL_VERIFICATION_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid EMAIL_VERIFICATION_TTL_SECS")?,
        })
    }
}

/// Email delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@clientbase.dev".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        })
    }
}

/// Avatar blob storage configuration
///
/// When `bucket` is unset the storage service runs in disabled mode and
/// avatar uploads are skipped with a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub bucket: Option<String>,
    pub public_base_url: Option<String>,
}

impl StorageSettings {
    fn from_env() -> Self {
        Self {
            bucket: env::var("S3_BUCKET").ok(),
            public_base_url: env::var("S3_PUBLIC_BASE_URL").ok(),
        }
    }
}

/// Cookie behavior for issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    fn from_env() -> Self {
        Self {
            secure: env::var("COOKIE_SECURE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }
}
