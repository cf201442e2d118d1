//! Configuration file support for liftc.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftc/config.toml`.

use crate::export::OutputFormat;
use crate::types::{builtin_defaults, Defaults, ExerciseDefaults, ShorthandConfig, Units};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Fallback program defaults, used for anything a document's `defaults` omits
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub units: Units,

    #[serde(default = "default_properties")]
    pub properties: Vec<String>,

    /// Whether implicit shorthand strings are accepted
    #[serde(default = "default_true")]
    pub shorthand: bool,

    #[serde(default = "default_true")]
    pub sets_before_reps: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            units: Units::default(),
            properties: default_properties(),
            shorthand: true,
            sets_before_reps: true,
        }
    }
}

/// Rendered output configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: true,
        }
    }
}

// Default value functions
fn default_properties() -> Vec<String> {
    builtin_defaults().exercises.properties.clone()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let Some(config_path) = Self::default_config_path() else {
            tracing::info!("No config directory available, using defaults");
            return Ok(Self::default());
        };

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// Falls back to `$HOME/.config` when the platform config directory is
    /// unknown; `None` if neither is available.
    pub fn default_config_path() -> Option<PathBuf> {
        let base = dirs::config_dir().or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
        })?;
        Some(base.join("liftc").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Program defaults the loader falls back on
    pub fn program_defaults(&self) -> Defaults {
        Defaults {
            units: self.defaults.units,
            exercises: ExerciseDefaults {
                properties: self.defaults.properties.clone(),
            },
            shorthand: ShorthandConfig {
                enabled: self.defaults.shorthand,
                sets_before_reps: self.defaults.sets_before_reps,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.units, Units::Kilograms);
        assert!(config.defaults.shorthand);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
        assert_eq!(config.program_defaults(), Defaults::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[defaults]
units = "pounds"
sets_before_reps = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let defaults = config.program_defaults();
        assert_eq!(defaults.units, Units::Pounds);
        assert!(!defaults.shorthand.sets_before_reps);
        assert!(defaults.shorthand.enabled); // default
        assert_eq!(defaults.exercises.properties, vec!["starting weight"]);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_unknown_units_rejected() {
        let toml_str = r#"
[defaults]
units = "stone"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("liftc").join("config.toml");

        let mut config = Config::default();
        config.output.format = OutputFormat::Csv;
        config.defaults.shorthand = false;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(!loaded.program_defaults().shorthand.enabled);
    }
}
