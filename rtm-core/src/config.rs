use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::template::TemplateFormat;

/// Connection settings for the requirements service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://rtm.example.com/api`
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Defaults applied when the command line does not say otherwise
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDefaults {
    /// Start every import in partial-mapping mode
    #[serde(default)]
    pub allow_partial: bool,
    #[serde(default)]
    pub template_format: TemplateFormat,
}

/// Import tool configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub defaults: ImportDefaults,
}

impl ImportConfig {
    /// Loads the configuration from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the configuration, falling back to defaults when the file does
    /// not exist, then applies environment overrides
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// RTM_API_URL and RTM_API_TOKEN take precedence over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("RTM_API_URL") {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(token) = std::env::var("RTM_API_TOKEN") {
            if !token.is_empty() {
                self.api.token = Some(token);
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    /// Save the configuration to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;

        // Ensure parent directories exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Creates a default config file if it doesn't exist
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        if path.as_ref().exists() {
            return Ok(());
        }
        Self::default().save(path)
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    // Check if RTM_CONFIG_PATH environment variable is set
    if let Ok(path) = std::env::var("RTM_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    // Default to ~/.rtm-import.yaml
    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

    Ok(home_dir.join(".rtm-import.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = ImportConfig::default();
        config.api.base_url = "https://rtm.example.com/api".to_string();
        config.api.token = Some("secret".to_string());
        config.defaults.allow_partial = true;
        config.defaults.template_format = TemplateFormat::Xlsx;
        config.save(&path)?;

        let loaded = ImportConfig::load(&path)?;
        assert_eq!(loaded, config);

        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.yaml");
        fs::write(&path, "api:\n  base_url: http://localhost:8080\n")?;

        let loaded = ImportConfig::load(&path)?;
        assert_eq!(loaded.api.base_url, "http://localhost:8080");
        assert_eq!(loaded.api.timeout_secs, 30);
        assert!(!loaded.defaults.allow_partial);
        assert_eq!(loaded.defaults.template_format, TemplateFormat::Csv);

        Ok(())
    }

    #[test]
    fn test_create_default_does_not_overwrite() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.yaml");
        fs::write(&path, "api:\n  base_url: http://keep.me\n")?;

        ImportConfig::create_default(&path)?;
        assert_eq!(ImportConfig::load(&path)?.api.base_url, "http://keep.me");

        Ok(())
    }

    #[test]
    fn test_invalid_yaml_is_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.yaml");
        fs::write(&path, "api: [not, a, map")?;
        assert!(ImportConfig::load(&path).is_err());
        Ok(())
    }
}
