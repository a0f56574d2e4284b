//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::progress::DistributionStrategy;
use crate::error::Error;

/// Deepest level the tree can be expanded to (tasks never expand)
pub const MAX_EXPAND_LEVEL: u8 = 3;

/// Sitetrack configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub distribution: DistributionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Levels expanded when a project is first shown
    pub default_expand_level: u8,
    /// Budget for breadth-first smart expansion
    pub smart_expand_max_nodes: usize,
    pub case_sensitive_search: bool,
    /// Rows per rendered window
    pub window_size: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            default_expand_level: 1,
            smart_expand_max_nodes: 200,
            case_sensitive_search: false,
            window_size: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub default_strategy: DistributionStrategy,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("SITETRACK_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("sitetrack")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or the defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration
    ///
    /// Failures are `Error::Config` so callers can downcast them for a code.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tree.default_expand_level > MAX_EXPAND_LEVEL {
            return Err(Error::Config(format!(
                "tree.default_expand_level must be between 0 and {}",
                MAX_EXPAND_LEVEL
            ))
            .into());
        }
        if self.tree.window_size == 0 {
            return Err(Error::Config("tree.window_size must be greater than 0".to_string()).into());
        }
        if self.distribution.default_strategy == DistributionStrategy::Manual {
            return Err(Error::Config(
                "distribution.default_strategy must be equal or proportional".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "tree.default_expand_level" => Ok(self.tree.default_expand_level.to_string()),
            "tree.smart_expand_max_nodes" => Ok(self.tree.smart_expand_max_nodes.to_string()),
            "tree.case_sensitive_search" => Ok(self.tree.case_sensitive_search.to_string()),
            "tree.window_size" => Ok(self.tree.window_size.to_string()),

            "distribution.default_strategy" => Ok(self.distribution.default_strategy.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `sitetrack config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "tree.default_expand_level" => {
                let level: u8 = value
                    .parse()
                    .with_context(|| format!("Invalid default_expand_level value: {}", value))?;
                if level > MAX_EXPAND_LEVEL {
                    return Err(anyhow!(
                        "Expand level must be between 0 and {}",
                        MAX_EXPAND_LEVEL
                    ));
                }
                self.tree.default_expand_level = level;
            }
            "tree.smart_expand_max_nodes" => {
                self.tree.smart_expand_max_nodes = value
                    .parse()
                    .with_context(|| format!("Invalid smart_expand_max_nodes value: {}", value))?;
            }
            "tree.case_sensitive_search" => {
                self.tree.case_sensitive_search = value
                    .parse()
                    .with_context(|| format!("Invalid case_sensitive_search value: {}", value))?;
            }
            "tree.window_size" => {
                let size: usize = value
                    .parse()
                    .with_context(|| format!("Invalid window_size value: {}", value))?;
                if size == 0 {
                    return Err(anyhow!("Window size must be greater than 0"));
                }
                self.tree.window_size = size;
            }

            "distribution.default_strategy" => {
                let strategy: DistributionStrategy = value.parse()?;
                if strategy == DistributionStrategy::Manual {
                    return Err(anyhow!(
                        "Invalid default strategy: {}. Valid options: equal, proportional",
                        value
                    ));
                }
                self.distribution.default_strategy = strategy;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `sitetrack config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "tree.default_expand_level",
            "tree.smart_expand_max_nodes",
            "tree.case_sensitive_search",
            "tree.window_size",
            "distribution.default_strategy",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
