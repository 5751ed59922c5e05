//! Configuration for view instances
//!
//! Controls the shape of generated identifiers. Can be built in code or
//! loaded from a TOML file:
//!
//! ```toml
//! [identifiers]
//! instance_length = 16
//! instance_charset = "lower_upper_digits"
//! binding_length = 16
//! binding_charset = "lower"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::ident::CharacterClass;

/// Errors that can occur when loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration options for views
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Length of generated instance identifiers
    pub instance_id_length: usize,

    /// Characters instance identifiers are drawn from
    pub instance_charset: CharacterClass,

    /// Length of generated attribute and event binding identifiers
    pub binding_id_length: usize,

    /// Characters binding identifiers are drawn from; must survive
    /// lowercasing since they end up in attribute names
    pub binding_charset: CharacterClass,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            instance_id_length: 16,
            instance_charset: CharacterClass::LowerUpperDigits,
            binding_id_length: 16,
            binding_charset: CharacterClass::Lower,
        }
    }
}

/// TOML structure for deserializing configs
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    identifiers: Option<TomlIdentifiers>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlIdentifiers {
    instance_length: Option<usize>,
    instance_charset: Option<CharacterClass>,
    binding_length: Option<usize>,
    binding_charset: Option<CharacterClass>,
}

impl ViewConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string; absent keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let ids = parsed.identifiers.unwrap_or_default();
        let defaults = Self::default();

        let config = Self {
            instance_id_length: ids.instance_length.unwrap_or(defaults.instance_id_length),
            instance_charset: ids.instance_charset.unwrap_or(defaults.instance_charset),
            binding_id_length: ids.binding_length.unwrap_or(defaults.binding_id_length),
            binding_charset: ids.binding_charset.unwrap_or(defaults.binding_charset),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the identifier settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_id_length == 0 || self.binding_id_length == 0 {
            return Err(ConfigError::Invalid(
                "identifier lengths must be greater than zero".to_string(),
            ));
        }
        if !self.binding_charset.is_lowercase_safe() {
            return Err(ConfigError::Invalid(format!(
                "binding charset {:?} contains uppercase characters",
                self.binding_charset
            )));
        }
        Ok(())
    }

    /// Set the instance identifier length
    pub fn with_instance_id_length(mut self, length: usize) -> Self {
        self.instance_id_length = length;
        self
    }

    /// Set the instance identifier charset
    pub fn with_instance_charset(mut self, charset: CharacterClass) -> Self {
        self.instance_charset = charset;
        self
    }

    /// Set the binding identifier length
    pub fn with_binding_id_length(mut self, length: usize) -> Self {
        self.binding_id_length = length;
        self
    }

    /// Set the binding identifier charset
    pub fn with_binding_charset(mut self, charset: CharacterClass) -> Self {
        self.binding_charset = charset;
        self
    }
}
