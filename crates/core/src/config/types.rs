use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

/// Remote catalog (Xtream player API) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Base URL of the panel, e.g. "http://provider.example:8080"
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Connect timeout in seconds (default: 5)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Timeout for metadata requests in seconds (default: 15).
    /// Episode downloads only use the connect timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry policy for idempotent catalog requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound for a single delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> u64 {
    10_000
}

/// Snapshot cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("cached_series_data.json")
}

/// Download destination configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    #[serde(default = "default_downloads_dir")]
    pub dir: PathBuf,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            dir: default_downloads_dir(),
        }
    }
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("downloads")
}

/// Progress streaming configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProgressConfig {
    /// Seconds a viewer waits for an event before a keep-alive is sent.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    /// How many finished jobs stay listed.
    #[serde(default = "default_job_retention")]
    pub job_retention: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            keep_alive_secs: default_keep_alive(),
            job_retention: default_job_retention(),
        }
    }
}

fn default_keep_alive() -> u64 {
    15
}

fn default_job_retention() -> usize {
    50
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub catalog: SanitizedCatalogConfig,
    pub cache: CacheConfig,
    pub downloads: DownloadsConfig,
    pub progress: ProgressConfig,
}

/// Catalog config with credentials hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub base_url: String,
    pub username: String,
    pub password_configured: bool,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            catalog: SanitizedCatalogConfig {
                base_url: config.catalog.base_url.clone(),
                username: config.catalog.username.clone(),
                password_configured: !config.catalog.password.is_empty(),
                connect_timeout_secs: config.catalog.connect_timeout_secs,
                request_timeout_secs: config.catalog.request_timeout_secs,
                retry: config.catalog.retry.clone(),
            },
            cache: config.cache.clone(),
            downloads: config.downloads.clone(),
            progress: config.progress.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[catalog]
base_url = "http://provider.example:8080"
username = "alice"
password = "s3cret"
"#;

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.catalog.connect_timeout_secs, 5);
        assert_eq!(config.catalog.request_timeout_secs, 15);
        assert_eq!(config.catalog.retry, RetryConfig::default());
        assert_eq!(
            config.cache.path.to_str().unwrap(),
            "cached_series_data.json"
        );
        assert_eq!(config.downloads.dir.to_str().unwrap(), "downloads");
        assert_eq!(config.progress.keep_alive_secs, 15);
        assert_eq!(config.progress.job_retention, 50);
    }

    #[test]
    fn test_deserialize_missing_catalog_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_custom_sections() {
        let toml = r#"
[catalog]
base_url = "http://provider.example"
username = "bob"
password = "pw"
request_timeout_secs = 30

[catalog.retry]
max_attempts = 5
initial_delay_ms = 250

[cache]
path = "/data/cache.json"

[downloads]
dir = "/media/downloads"

[progress]
keep_alive_secs = 30
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.catalog.request_timeout_secs, 30);
        assert_eq!(config.catalog.retry.max_attempts, 5);
        assert_eq!(config.catalog.retry.initial_delay_ms, 250);
        assert_eq!(config.catalog.retry.backoff_multiplier, 2.0);
        assert_eq!(config.cache.path.to_str().unwrap(), "/data/cache.json");
        assert_eq!(config.downloads.dir.to_str().unwrap(), "/media/downloads");
        assert_eq!(config.progress.keep_alive_secs, 30);
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.catalog.password_configured);
        assert_eq!(sanitized.catalog.username, "alice");

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("s3cret"));
    }
}
