//! Merge configuration
//!
//! Settings are read from an optional TOML file, then overridden from the
//! environment, then validated.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::table::SeedingMode;
use crate::tombstone::MetadataKeys;

pub const ENV_SEEDING_MODE: &str = "REPORTFOLD_SEEDING_MODE";
pub const ENV_LOG_LEVEL: &str = "REPORTFOLD_LOG_LEVEL";
pub const ENV_DELETED_POLICY_PREFIX: &str = "REPORTFOLD_DELETED_POLICY_PREFIX";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Merge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// How deletion markers gate reseeding
    pub seeding_mode: SeedingMode,

    /// Default log filter for the command-line front end
    pub log_level: String,

    /// Metadata keys carrying deletion information
    pub keys: MetadataKeys,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            seeding_mode: SeedingMode::Compatible,
            log_level: "info".to_string(),
            keys: MetadataKeys::default(),
        }
    }
}

/// Loads, overrides and validates a [`MergeConfig`]
pub struct MergeConfigManager {
    config: MergeConfig,
    config_path: Option<PathBuf>,
}

impl Default for MergeConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeConfigManager {
    pub fn new() -> Self {
        Self {
            config: MergeConfig::default(),
            config_path: None,
        }
    }

    pub fn with_config_file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config: MergeConfig::default(),
            config_path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Load file, apply environment overrides and validate
    pub fn load(mut self) -> Result<MergeConfig, ConfigError> {
        self.load_config()?;
        self.apply_env_overrides()?;
        self.validate()?;
        Ok(self.config)
    }

    /// Load configuration from file; a missing file keeps the defaults
    pub fn load_config(&mut self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                self.config = toml::from_str(&content)?;
                info!("Loaded merge configuration from {:?}", path);
            } else {
                warn!("Config file {:?} not found, using defaults", path);
            }
        }
        Ok(())
    }

    /// Render the current configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.config)?)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_SEEDING_MODE) {
            self.config.seeding_mode = mode.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_SEEDING_MODE.to_string(),
                value: mode.clone(),
            })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.config.log_level = level;
        }
        if let Some(prefix) = lookup(ENV_DELETED_POLICY_PREFIX) {
            self.config.keys.deleted_policy_prefix = prefix;
        }
        Ok(())
    }

    pub fn get_config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn get_config_mut(&mut self) -> &mut MergeConfig {
        &mut self.config
    }

    /// Reject empty metadata keys and log level
    pub fn validate(&self) -> Result<(), ConfigError> {
        let keys = &self.config.keys;
        let required = [
            ("keys.resource_kind_annotation", &keys.resource_kind_annotation),
            ("keys.resource_name_annotation", &keys.resource_name_annotation),
            ("keys.namespace_label", &keys.namespace_label),
            ("keys.deleted_policy_prefix", &keys.deleted_policy_prefix),
            ("log_level", &self.config.log_level),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = MergeConfig::default();
        assert_eq!(config.seeding_mode, SeedingMode::Compatible);
        assert_eq!(config.keys, MetadataKeys::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MergeConfigManager::with_config_file(dir.path().join("absent.toml"))
            .load()
            .unwrap();
        assert_eq!(config.seeding_mode, SeedingMode::Compatible);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "seeding_mode = \"strict\"\n\n[keys]\nnamespace_label = \"example.io/ns\""
        )
        .unwrap();

        let mut manager = MergeConfigManager::with_config_file(file.path());
        manager.load_config().unwrap();
        let config = manager.get_config();

        assert_eq!(config.seeding_mode, SeedingMode::Strict);
        assert_eq!(config.keys.namespace_label, "example.io/ns");
        assert_eq!(
            config.keys.resource_kind_annotation,
            MetadataKeys::default().resource_kind_annotation
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let mut manager = MergeConfigManager::new();
        manager.get_config_mut().seeding_mode = SeedingMode::Strict;
        let rendered = manager.to_toml().unwrap();

        let parsed: MergeConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(&parsed, manager.get_config());
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "seeding_mode = \"sometimes\"").unwrap();

        let mut manager = MergeConfigManager::with_config_file(file.path());
        assert!(matches!(manager.load_config(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_SEEDING_MODE, "strict"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_DELETED_POLICY_PREFIX, "del"),
        ]
        .into_iter()
        .collect();

        let mut manager = MergeConfigManager::new();
        manager
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        let config = manager.get_config();
        assert_eq!(config.seeding_mode, SeedingMode::Strict);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.keys.deleted_policy_prefix, "del");
    }

    #[test]
    fn test_invalid_override() {
        let mut manager = MergeConfigManager::new();
        let err = manager
            .apply_overrides(|key| (key == ENV_SEEDING_MODE).then(|| "sometimes".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validation() {
        let mut manager = MergeConfigManager::new();
        assert!(manager.validate().is_ok());

        manager.get_config_mut().keys.namespace_label = " ".to_string();
        assert!(manager.validate().is_err());
    }
}
