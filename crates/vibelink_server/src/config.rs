use std::env;
use std::path::PathBuf;

use vibelink_core::config::{DEFAULT_CACHE_TTL_SECS, DEFAULT_TIMEOUT_SECS, ResolverConfig};

/// Default header carrying the authenticated owner id
pub const DEFAULT_OWNER_HEADER: &str = "x-vibelink-owner";

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3040)
    pub port: u16,
    /// Database file path (default: ./vibelink.db)
    pub database_path: PathBuf,
    /// Header the upstream auth gateway sets to the signed-in owner id
    pub owner_header: String,
    /// Channel resolver settings
    pub resolver: ResolverConfig,
    /// CORS allowed origins (comma-separated)
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .unwrap_or_else(|| "3040".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_path =
            PathBuf::from(lookup("DATABASE_PATH").unwrap_or_else(|| "./vibelink.db".to_string()));

        let owner_header = lookup("OWNER_HEADER")
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_OWNER_HEADER.to_string());

        let mut resolver = ResolverConfig {
            cache_ttl_secs: parse_secs(
                lookup("CHANNEL_CACHE_TTL_SECS"),
                DEFAULT_CACHE_TTL_SECS,
                ConfigError::InvalidCacheTtl,
            )?,
            timeout_secs: parse_secs(
                lookup("RESOLVER_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
                ConfigError::InvalidTimeout,
            )?,
            ..ResolverConfig::default()
        };
        if let Some(agent) = lookup("RESOLVER_USER_AGENT").filter(|a| !a.trim().is_empty()) {
            resolver.user_agent = agent;
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            host,
            port,
            database_path,
            owner_header,
            resolver,
            cors_origins,
        })
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_secs(value: Option<String>, default: u64, err: ConfigError) -> Result<u64, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| err),
        None => Ok(default),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPort,
    InvalidCacheTtl,
    InvalidTimeout,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "Invalid PORT environment variable"),
            ConfigError::InvalidCacheTtl => {
                write!(f, "Invalid CHANNEL_CACHE_TTL_SECS environment variable")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "Invalid RESOLVER_TIMEOUT_SECS environment variable")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
