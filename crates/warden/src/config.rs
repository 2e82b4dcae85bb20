//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Token signing configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Base64-encoded signing secret, at least 64 bytes once decoded
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_token_validity")]
    pub token_validity_in_seconds: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_validity_in_seconds: default_token_validity(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("token_validity_in_seconds", &self.token_validity_in_seconds)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Initial administrator created when the user store is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_bootstrap_enabled")]
    pub enabled: bool,
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: default_bootstrap_enabled(),
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

/// Longest accepted token lifetime (ten years)
pub const MAX_TOKEN_VALIDITY_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/warden.db".to_string()
}

fn default_token_validity() -> i64 {
    86400 // 24 hours
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_bootstrap_enabled() -> bool {
    true
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin".to_string()
}

impl Config {
    /// Load configuration from a file, falling back to defaults when it is absent
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Checks that do not need the signing key itself
    pub fn validate(&self) -> Result<()> {
        let validity = self.jwt.token_validity_in_seconds;
        if validity <= 0 || validity > MAX_TOKEN_VALIDITY_SECONDS {
            anyhow::bail!(
                "jwt.token_validity_in_seconds must be between 1 and {}, got {}",
                MAX_TOKEN_VALIDITY_SECONDS,
                validity
            );
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_missing_sections() {
        let config = Config::from_toml("[jwt]\nsecret = \"abc\"\n").unwrap();
        assert_eq!(config.jwt.secret, "abc");
        assert_eq!(config.jwt.token_validity_in_seconds, 86400);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, "pretty");
        assert!(config.bootstrap.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let content = r#"
            [server]
            bind_address = "127.0.0.1"
            port = 9000

            [database]
            path = "/tmp/warden.db"

            [jwt]
            secret = "c2VjcmV0"
            token_validity_in_seconds = 3600

            [logging]
            level = "debug"
            format = "json"

            [bootstrap]
            enabled = false
        "#;

        let config = Config::from_toml(content).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, "/tmp/warden.db");
        assert_eq!(config.jwt.token_validity_in_seconds, 3600);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.bootstrap.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.jwt.token_validity_in_seconds = 0;
        assert!(config.validate().is_err());

        config.jwt.token_validity_in_seconds = 9_000_000_000_000;
        assert!(config.validate().is_err());

        config.jwt.token_validity_in_seconds = i64::MAX;
        assert!(config.validate().is_err());

        config.jwt.token_validity_in_seconds = MAX_TOKEN_VALIDITY_SECONDS;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.database.path, "./data/warden.db");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut config = Config::default();
        config.jwt.secret = "c3VwZXItc2VjcmV0".to_string();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("c3VwZXItc2VjcmV0"));
    }
}
