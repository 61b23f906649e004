//! Configuration management for azdo-pipelines.
//!
//! Settings come from a TOML file plus environment overrides. The config file
//! lives in a platform-specific location:
//!
//! - **macOS/Linux**: `~/.config/azdo-pipelines/config.toml`
//! - **Windows**: `%APPDATA%\azdo-pipelines\config.toml`
//!
//! The access token is never written to the file. It comes from
//! `AZURE_DEVOPS_TOKEN` or the OS keychain (see `azdo-storage`).
//!
//! # Example
//!
//! ```ignore
//! use azdo_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.apply_env();
//! let settings = config.validate()?; // fails fast on missing settings
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "azdo-pipelines";

/// Default Azure DevOps service URL.
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

/// Default REST api-version for the pipelines endpoints.
pub const DEFAULT_API_VERSION: &str = "7.1";

/// Default port for the REST front-end.
pub const DEFAULT_PORT: u16 = 3000;

// Environment variables
pub const ENV_ORGANIZATION: &str = "AZURE_DEVOPS_ORGANIZATION";
pub const ENV_ORGANIZATION_SHORT: &str = "AZURE_DEVOPS_ORG";
pub const ENV_PROJECT: &str = "AZURE_DEVOPS_PROJECT";
pub const ENV_TOKEN: &str = "AZURE_DEVOPS_TOKEN";
pub const ENV_BASE_URL: &str = "AZURE_DEVOPS_BASE_URL";
pub const ENV_API_VERSION: &str = "AZURE_DEVOPS_API_VERSION";
pub const ENV_PORT: &str = "PORT";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Azure DevOps connection
    #[serde(default)]
    pub azure: AzureConfig,

    /// REST front-end
    #[serde(default)]
    pub server: ServerConfig,
}

/// Azure DevOps connection settings as stored on disk.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Service URL (for Azure DevOps Server or tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Personal access token; only ever set from env or keychain
    #[serde(skip)]
    pub token: Option<String>,
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// REST front-end settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ServerConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

/// Fully resolved connection settings, produced by [`Config::validate`].
#[derive(Clone, PartialEq)]
pub struct AzureSettings {
    pub organization: String,
    pub project: String,
    pub token: String,
    pub base_url: String,
    pub api_version: String,
}

impl fmt::Debug for AzureSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureSettings")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using a custom variable lookup.
    ///
    /// Empty values are ignored so that `FOO=` does not clear a file setting.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(org) = get(ENV_ORGANIZATION).or_else(|| get(ENV_ORGANIZATION_SHORT)) {
            self.azure.organization = Some(org);
        }
        if let Some(project) = get(ENV_PROJECT) {
            self.azure.project = Some(project);
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.azure.token = Some(token);
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.azure.base_url = Some(url);
        }
        if let Some(version) = get(ENV_API_VERSION) {
            self.azure.api_version = Some(version);
        }
        if let Some(port) = get(ENV_PORT) {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = Some(port),
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid {}", ENV_PORT),
            }
        }
    }

    /// Check that every required setting is present.
    ///
    /// The error lists all missing keys, not just the first one.
    pub fn validate(&self) -> Result<AzureSettings> {
        let missing: Vec<&str> = [
            ("azure.token", non_empty(&self.azure.token)),
            ("azure.organization", non_empty(&self.azure.organization)),
            ("azure.project", non_empty(&self.azure.project)),
        ]
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| *key)
        .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required configuration: {}",
                missing.join(", ")
            )));
        }

        Ok(AzureSettings {
            organization: non_empty(&self.azure.organization)
                .unwrap_or_default()
                .to_string(),
            project: non_empty(&self.azure.project).unwrap_or_default().to_string(),
            token: non_empty(&self.azure.token).unwrap_or_default().to_string(),
            base_url: non_empty(&self.azure.base_url)
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_version: non_empty(&self.azure.api_version)
                .unwrap_or(DEFAULT_API_VERSION)
                .to_string(),
        })
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `azure.project`, `server.port`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match (section, field) {
            ("azure", "organization" | "org") => self.azure.organization = Some(value.to_string()),
            ("azure", "project") => self.azure.project = Some(value.to_string()),
            ("azure", "base_url" | "url") => self.azure.base_url = Some(value.to_string()),
            ("azure", "api_version") => self.azure.api_version = Some(value.to_string()),
            ("azure", "token") => {
                return Err(Error::Config(
                    "Tokens are not stored in the config file; use `azdo config token`"
                        .to_string(),
                ))
            }
            ("server", "port") => {
                let port = value
                    .parse::<u16>()
                    .map_err(|_| Error::Config(format!("Invalid port: {}", value)))?;
                self.server.port = Some(port);
            }
            ("azure" | "server", _) => {
                return Err(Error::Config(format!(
                    "Unknown {} config field: {}",
                    section, field
                )))
            }
            _ => return Err(Error::Config(format!("Unknown config section: {}", section))),
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match (section, field) {
            ("azure", "organization" | "org") => Ok(self.azure.organization.clone()),
            ("azure", "project") => Ok(self.azure.project.clone()),
            ("azure", "base_url" | "url") => Ok(self.azure.base_url.clone()),
            ("azure", "api_version") => Ok(self.azure.api_version.clone()),
            ("server", "port") => Ok(self.server.port.map(|p| p.to_string())),
            ("azure" | "server", _) => Err(Error::Config(format!(
                "Unknown {} config field: {}",
                section, field
            ))),
            _ => Err(Error::Config(format!("Unknown config section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.azure.organization.is_none());
        assert!(config.azure.token.is_none());
        assert_eq!(config.server.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_validate_lists_every_missing_key() {
        let err = Config::default().validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("azure.token"));
        assert!(msg.contains("azure.organization"));
        assert!(msg.contains("azure.project"));
    }

    #[test]
    fn test_validate_treats_blank_as_missing() {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            (ENV_ORGANIZATION, "org"),
            (ENV_PROJECT, "proj"),
        ]));
        config.azure.token = Some("   ".to_string());

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("azure.token"));
        assert!(!err.to_string().contains("azure.project"));
    }

    #[test]
    fn test_validate_applies_defaults() {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            (ENV_ORGANIZATION_SHORT, "org"),
            (ENV_PROJECT, "proj"),
            (ENV_TOKEN, "pat"),
        ]));

        let settings = config.validate().unwrap();
        assert_eq!(settings.organization, "org");
        assert_eq!(settings.project, "proj");
        assert_eq!(settings.token, "pat");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.set("azure.organization", "file-org").unwrap();
        config.set("azure.base_url", "https://azure.example.com/").unwrap();

        config.apply_env_from(env(&[
            (ENV_ORGANIZATION, "env-org"),
            (ENV_ORGANIZATION_SHORT, "ignored"),
            (ENV_API_VERSION, "7.0"),
            (ENV_PORT, "8080"),
        ]));

        assert_eq!(config.azure.organization.as_deref(), Some("env-org"));
        assert_eq!(config.azure.api_version.as_deref(), Some("7.0"));
        assert_eq!(config.server.port(), 8080);

        config.azure.project = Some("proj".to_string());
        config.azure.token = Some("pat".to_string());
        let settings = config.validate().unwrap();
        assert_eq!(settings.base_url, "https://azure.example.com");
    }

    #[test]
    fn test_env_ignores_invalid_port() {
        let mut config = Config::default();
        config.server.port = Some(4000);
        config.apply_env_from(env(&[(ENV_PORT, "not-a-port")]));
        assert_eq!(config.server.port(), 4000);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        config.set("azure.org", "my-org").unwrap();
        config.set("azure.project", "my-project").unwrap();
        config.set("server.port", "9000").unwrap();

        assert_eq!(
            config.get("azure.organization").unwrap(),
            Some("my-org".to_string())
        );
        assert_eq!(
            config.get("azure.project").unwrap(),
            Some("my-project".to_string())
        );
        assert_eq!(config.get("server.port").unwrap(), Some("9000".to_string()));
        assert_eq!(config.get("azure.api_version").unwrap(), None);
    }

    #[test]
    fn test_invalid_key() {
        let mut config = Config::default();

        assert!(config.set("invalid", "value").is_err());
        assert!(config.set("too.many.parts", "value").is_err());
        assert!(config.set("unknown.field", "value").is_err());
        assert!(config.set("azure.unknown", "value").is_err());
        assert!(config.set("server.port", "abc").is_err());
        assert!(config.set("azure.token", "secret").is_err());
        assert!(config.get("server.unknown").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = Config::default();
        config.set("azure.organization", "test-org").unwrap();
        config.set("azure.project", "test-project").unwrap();
        config.azure.token = Some("never-written".to_string());

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[azure]"));
        assert!(contents.contains("organization = \"test-org\""));
        assert!(!contents.contains("never-written"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.azure.organization.as_deref(), Some("test-org"));
        assert_eq!(loaded.azure.project.as_deref(), Some("test-project"));
        assert!(loaded.azure.token.is_none());
    }

    #[test]
    fn test_load_nonexistent() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(config.azure.organization.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[azure\norganization = ").unwrap();

        let err = Config::load_from(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.azure.token = Some("super-secret".to_string());
        assert!(!format!("{:?}", config).contains("super-secret"));

        config.azure.organization = Some("o".to_string());
        config.azure.project = Some("p".to_string());
        let settings = config.validate().unwrap();
        assert!(!format!("{:?}", settings).contains("super-secret"));
    }
}
