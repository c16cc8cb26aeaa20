use std::env;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub csrf: CsrfConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS (the admin front end).
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded slot photos are written to.
    pub root: PathBuf,
    /// Public URL prefix the media directory is served under.
    pub url_prefix: String,
    /// Upper bound for a single multipart upload body.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsrfConfig {
    pub cookie_name: String,
    pub header_name: String,
    /// Whether to set the `Secure` flag on the token cookie.
    /// Read from env var `CSRF_COOKIE_SECURE` (accepted values: "true"/"false", "1"/"0", "yes"/"no").
    pub cookie_secure: bool,
}

/// Client-side polling parameters for the sync monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub poll_interval_seconds: u64,
    pub idle_threshold_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/mic_tracker.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            media: MediaConfig {
                root: env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("data/media")),
                url_prefix: normalize_url_prefix(
                    &env::var("MEDIA_URL").unwrap_or_else(|_| "/media".to_string()),
                ),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string()))?,
            },
            csrf: CsrfConfig {
                cookie_name: "csrftoken".to_string(),
                header_name: "x-csrftoken".to_string(),
                cookie_secure: match env::var("CSRF_COOKIE_SECURE") {
                    Ok(v) => parse_bool(&v).unwrap_or(false),
                    Err(_) => false,
                },
            },
            sync: SyncConfig {
                poll_interval_seconds: env::var("SYNC_POLL_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .map_err(|_| {
                        ConfigError::InvalidValue("SYNC_POLL_INTERVAL_SECONDS".to_string())
                    })?,
                idle_threshold_seconds: env::var("SYNC_IDLE_THRESHOLD_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .map_err(|_| {
                        ConfigError::InvalidValue("SYNC_IDLE_THRESHOLD_SECONDS".to_string())
                    })?,
            },
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// `media/` and `/media/` both become `/media`.
fn normalize_url_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    format!("/{}", trimmed)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://data/mic_tracker.db".to_string(),
                max_connections: 5,
            },
            media: MediaConfig {
                root: PathBuf::from("data/media"),
                url_prefix: "/media".to_string(),
                max_upload_bytes: 10 * 1024 * 1024,
            },
            csrf: CsrfConfig {
                cookie_name: "csrftoken".to_string(),
                header_name: "x-csrftoken".to_string(),
                cookie_secure: false,
            },
            sync: SyncConfig {
                poll_interval_seconds: 5,
                idle_threshold_seconds: 30,
            },
        }
    }
}
