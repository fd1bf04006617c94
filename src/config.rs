use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Root directory for uploaded photos and generated thumbnails
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Directory photo thumbnail settings
    #[serde(default)]
    pub photo: PhotoConfig,
    /// Freshdesk helpdesk synchronisation
    #[serde(default)]
    pub freshdesk: FreshdeskConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database type (postgres)
    #[serde(default = "default_db_type", rename = "type")]
    pub db_type: String,
    /// Database host
    #[serde(default = "default_db_host")]
    pub host: String,
    /// Database port
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// Database name
    #[serde(default = "default_db_name", rename = "database")]
    pub name: String,
    /// Database user
    #[serde(default = "default_db_user", rename = "username")]
    pub user: String,
    /// Database password
    #[serde(default)]
    pub password: String,
    /// Maximum pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Thumbnail pushed to the directory service. The defaults give ~10kb JPEGs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhotoConfig {
    /// Bounding box edge in pixels
    #[serde(default = "default_photo_size")]
    pub size: u32,
    /// Initial JPEG quality
    #[serde(default = "default_photo_quality")]
    pub quality: u8,
    /// Size budget for the encoded thumbnail
    #[serde(default = "default_photo_max_bytes")]
    pub max_bytes: usize,
    /// Encode attempts before giving up on the budget
    #[serde(default = "default_photo_attempts")]
    pub attempts: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FreshdeskConfig {
    /// Helpdesk domain, e.g. "example.freshdesk.com"
    #[serde(default)]
    pub domain: String,
    /// API key (sent as the basic auth username)
    #[serde(default)]
    pub api_key: String,
    /// Records per page requested from the API
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Hard stop for paged listings
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Seconds between background syncs (0 disables the scheduler)
    #[serde(default)]
    pub sync_interval_secs: u64,
}

impl FreshdeskConfig {
    /// Whether enough is configured to talk to the API
    pub fn enabled(&self) -> bool {
        !self.domain.is_empty() && !self.api_key.is_empty()
    }
}

// Default value functions
fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_db_type() -> String {
    "postgres".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "itassets".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_photo_size() -> u32 {
    240
}

fn default_photo_quality() -> u8 {
    75
}

fn default_photo_max_bytes() -> usize {
    10_000
}

fn default_photo_attempts() -> u32 {
    12
}

fn default_per_page() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            media_root: default_media_root(),
            log: LogConfig::default(),
            database: DatabaseConfig::default(),
            photo: PhotoConfig::default(),
            freshdesk: FreshdeskConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: default_db_type(),
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: default_db_user(),
            password: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            size: default_photo_size(),
            quality: default_photo_quality(),
            max_bytes: default_photo_max_bytes(),
            attempts: default_photo_attempts(),
        }
    }
}

impl Default for FreshdeskConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_key: String::new(),
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            sync_interval_secs: 0,
        }
    }
}

impl DatabaseConfig {
    /// Generate database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
