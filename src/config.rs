use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Expand environment variables and tilde in a path string.
/// Supports: $HOME, ${VAR}, ~/path
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_server_selection_timeout_secs() -> u64 {
    10
}

fn default_app_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

/// Settings for the adapter process itself. Plan properties come from the
/// deployment manifest instead, see [`crate::plan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Bound on opening a TCP connection to a single endpoint
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Bound on finding any usable endpoint before giving up
    #[serde(default = "default_server_selection_timeout_secs")]
    pub server_selection_timeout_secs: u64,

    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            server_selection_timeout_secs: default_server_selection_timeout_secs(),
            app_name: default_app_name(),
        }
    }
}

impl AdapterConfig {
    pub fn default_config_file() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get config directory")?
            .join("mongodb-service-adapter")
            .join("config.yaml"))
    }

    /// Load from an explicit path, or from the default location if a file
    /// exists there. Falls back to built-in defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let config_file = match explicit {
            Some(path) => {
                let path = PathBuf::from(expand_path(path));
                if !path.exists() {
                    bail!("Configuration file not found: {}", path.display());
                }
                path
            }
            None => match Self::default_config_file() {
                Ok(path) if path.exists() => path,
                _ => {
                    tracing::debug!("No configuration file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config = Self::from_file(&config_file)?;
        tracing::debug!("Configuration loaded from {:?}", config_file);
        Ok(config)
    }

    fn from_file(config_file: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_file).context("Failed to read config file")?;
        Self::from_yaml(&content)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            bail!("connect_timeout_secs must be greater than zero");
        }
        if self.server_selection_timeout_secs == 0 {
            bail!("server_selection_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_mapping() {
        let config = AdapterConfig::from_yaml("{}").unwrap();
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.server_selection_timeout_secs, 10);
        assert_eq!(config.app_name, "mongodb-service-adapter");
    }

    #[test]
    fn test_overrides() {
        let config =
            AdapterConfig::from_yaml("connect_timeout_secs: 2\napp_name: broker-a\n").unwrap();
        assert_eq!(config.connect_timeout_secs, 2);
        assert_eq!(config.server_selection_timeout_secs, 10);
        assert_eq!(config.app_name, "broker-a");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(AdapterConfig::from_yaml("server_selection_timeout_secs: 0\n").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(AdapterConfig::load(Some("/nonexistent/adapter.yaml")).is_err());
    }
}
