//! Configuration for property validation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (properties.toml)
//! - Environment variables (PROPERTIES__*)
//!
//! ## Example config file (properties.toml):
//! ```toml
//! [structured]
//! error_on_unknown_field = false
//! error_on_invalid_field = true
//!
//! [properties]
//! lowercase_names = true
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::types::FieldPolicy;

/// Main configuration for property validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Error policy applied to every structured tuple schema
    #[serde(default)]
    pub structured: FieldPolicy,

    /// Property name handling
    #[serde(default)]
    pub properties: PropertiesConfig,
}

/// Property name handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertiesConfig {
    /// Lower-case property names before registry lookup
    #[serde(default = "default_true")]
    pub lowercase_names: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            lowercase_names: true,
        }
    }
}

impl ValidationConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file at `config_path`
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["properties.toml", ".properties.toml", "config/properties.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "properties", "property-schemas") {
            let xdg_config = dirs.config_dir().join("properties.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // PROPERTIES__STRUCTURED__ERROR_ON_UNKNOWN_FIELD=true
        builder = builder.add_source(
            Environment::with_prefix("PROPERTIES")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert!(!config.structured.error_on_unknown_field);
        assert!(config.structured.error_on_invalid_field);
        assert!(config.properties.lowercase_names);
    }

    #[test]
    fn test_serialize_config() {
        let config = ValidationConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[structured]"));
        assert!(toml_str.contains("[properties]"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");

        let mut config = ValidationConfig::default();
        config.structured.error_on_unknown_field = true;
        config.properties.lowercase_names = false;
        config.save(&path).unwrap();

        let loaded = ValidationConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[structured]\nerror_on_unknown_field = true\n").unwrap();

        let loaded = ValidationConfig::load_from(Some(&path)).unwrap();
        assert!(loaded.structured.error_on_unknown_field);
        assert!(loaded.structured.error_on_invalid_field);
        assert!(loaded.properties.lowercase_names);
    }

    #[test]
    fn test_missing_required_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ValidationConfig::load_from(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
