use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::import::ImportConfig;
use crate::source::MangadexConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub source: MangadexConfig,
    #[serde(default)]
    pub import: ImportConfig,
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
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("mangawatch.db")
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub source: SanitizedSourceConfig,
    pub import: ImportConfig,
}

/// Source config as exposed over the API (user agent elided)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            source: SanitizedSourceConfig {
                base_url: config.source.base_url.clone(),
                timeout_secs: config.source.timeout_secs,
            },
            import: config.import.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "mangawatch.db");
        assert_eq!(config.source.base_url, "https://api.mangadex.org");
        assert_eq!(config.import.batch_size, 100);
    }

    #[test]
    fn test_deserialize_overrides() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/catalog.sqlite"

[source]
base_url = "http://localhost:9999"

[import]
batch_size = 50
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(
            config.database.path.to_str().unwrap(),
            "/data/catalog.sqlite"
        );
        assert_eq!(config.source.base_url, "http://localhost:9999");
        assert_eq!(config.import.batch_size, 50);
        // Untouched sections keep their defaults.
        assert_eq!(config.import.max_retries, 3);
    }

    #[test]
    fn test_sanitized_config() {
        let config = Config::default();
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.server.port, 8080);
        assert_eq!(sanitized.source.base_url, "https://api.mangadex.org");
        assert_eq!(sanitized.import.rollover_threshold, 9_900);
        let json = serde_json::to_value(&sanitized).unwrap();
        assert!(json.get("source").unwrap().get("user_agent").is_none());
    }
}
