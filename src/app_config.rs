//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with HOMERATE_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! The database URL is read from `DATABASE_URL`, not from this file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Shown in startup logs
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "HomeRate".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Maximum pooled database connections
    pub max_db_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_db_connections: 10,
        }
    }
}

/// Builder directory listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Builders per page on the public directory
    pub page_size: u64,
    /// Builders per page on the admin console
    pub admin_page_size: u64,
    /// Upper bound for a caller-supplied page size
    pub max_page_size: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            admin_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Review schema configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Seed the default rating categories when the schema table is empty
    pub seed_defaults: bool,
    /// Seconds the public schema listing may be served from cache
    pub cache_ttl_seconds: u64,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            seed_defaults: true,
            cache_ttl_seconds: 30,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub schema: SchemaConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., HOMERATE_SERVER__BIND_ADDRESS, HOMERATE_DIRECTORY__PAGE_SIZE
            .add_source(
                Environment::with_prefix("HOMERATE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Initialize application configuration
///
/// This triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = get_config();
    log::info!(
        "Configuration loaded: site.name = {}, server.bind_address = {}",
        config.site.name,
        config.server.bind_address
    );
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// Get server configuration
pub fn server() -> ServerConfig {
    get_config().server
}

/// Get directory configuration
pub fn directory() -> DirectoryConfig {
    get_config().directory
}

/// Get schema configuration
pub fn schema() -> SchemaConfig {
    get_config().schema
}
