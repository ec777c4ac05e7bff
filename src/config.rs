//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Which keyed record store backs profiles and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local store (development and tests).
    Memory,
    /// Google Cloud Firestore (or its emulator).
    Firestore,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Firestore => "firestore",
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "firestore" => Ok(StorageBackend::Firestore),
            _ => Err(ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                value: value.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Record store backend
    pub storage_backend: StorageBackend,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,
    /// Optional JSON file replacing the built-in badge catalog
    pub badge_catalog_path: Option<String>,
    /// Budget for a leaderboard scan before it is abandoned
    pub leaderboard_timeout: Duration,
    /// How long a computed ranking is served without recomputation
    pub leaderboard_cache_ttl: Duration,
}

impl Config {
    /// Config for tests: in-memory store, short budgets.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            storage_backend: StorageBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            badge_catalog_path: None,
            leaderboard_timeout: Duration::from_millis(500),
            leaderboard_cache_ttl: Duration::from_secs(0),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_backend: StorageBackend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;

        let gcp_project_id = match (storage_backend, env::var("GCP_PROJECT_ID")) {
            (_, Ok(project)) => project,
            (StorageBackend::Firestore, Err(_)) => {
                return Err(ConfigError::Missing("GCP_PROJECT_ID"))
            }
            (StorageBackend::Memory, Err(_)) => "local-dev".to_string(),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            storage_backend,
            gcp_project_id,
            badge_catalog_path: env::var("BADGE_CATALOG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            leaderboard_timeout: Duration::from_millis(parse_u64(
                "LEADERBOARD_TIMEOUT_MS",
                2000,
            )?),
            leaderboard_cache_ttl: Duration::from_secs(parse_u64(
                "LEADERBOARD_CACHE_TTL_SECS",
                300,
            )?),
        })
    }
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
