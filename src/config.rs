//! Configuration loading using Figment.
//!
//! Settings are loaded from:
//! 1. `config.toml` (base configuration)
//! 2. Environment variables (prefixed with `KDC101_`)
//!
//! # Environment Variable Overrides
//!
//! ```text
//! KDC101_APPLICATION_LOG_LEVEL=debug
//! KDC101_STAGE_EPSILON=0.1
//! ```
//!
//! The `stage` section carries the two values the host framework reads off
//! the driver rather than the hardware: the display unit for positions and
//! the epsilon tolerance below which a commanded move counts as complete.
//! Both are configuration, not driver logic.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationSettings,
    /// Stage settings exposed to the host framework
    #[serde(default)]
    pub stage: StageSettings,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Stage configuration declared to the host framework
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSettings {
    /// Instrument identifier used in logs and status updates
    #[serde(default = "default_stage_id")]
    pub id: String,
    /// Position unit reported to the host
    #[serde(default = "default_units")]
    pub units: String,
    /// Positional tolerance below which the host considers a move complete
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            id: default_stage_id(),
            units: default_units(),
            epsilon: default_epsilon(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            application: ApplicationSettings::default(),
            stage: StageSettings::default(),
        }
    }
}

fn default_app_name() -> String {
    "kdc101-driver".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stage_id() -> String {
    "kdc101".to_string()
}

fn default_units() -> String {
    "mm".to_string()
}

fn default_epsilon() -> f64 {
    0.05
}

impl Settings {
    /// Load configuration from `config.toml` and environment variables
    ///
    /// Environment variables (`KDC101_` prefix) take precedence over the
    /// file. The result is validated before it is returned.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("KDC101_").split("_"))
            .extract()
            .map_err(ConfigError::LoadError)?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level is one of trace, debug, info, warn, error
    /// - Stage id and units are non-empty
    /// - Epsilon is strictly positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.stage.id.is_empty() {
            return Err(ConfigError::ValidationError(
                "'stage.id' cannot be empty".to_string(),
            ));
        }

        if self.stage.units.is_empty() {
            return Err(ConfigError::ValidationError(
                "'stage.units' cannot be empty".to_string(),
            ));
        }

        if self.stage.epsilon <= 0.0 || self.stage.epsilon.is_nan() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid epsilon {}. Must be > 0",
                self.stage.epsilon
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.stage.units, "mm");
        assert_eq!(settings.stage.epsilon, 0.05);
        assert_eq!(settings.application.log_level, "info");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [application]
            name = "qlm-lab"
            log_level = "debug"

            [stage]
            id = "sample_stage"
            epsilon = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(settings.application.name, "qlm-lab");
        assert_eq!(settings.stage.id, "sample_stage");
        assert_eq!(settings.stage.epsilon, 0.1);
        // Units fall back to the default when omitted
        assert_eq!(settings.stage.units, "mm");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::default();
        settings.application.log_level = "verbose".to_string();

        let result = settings.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log_level"));
    }

    #[test]
    fn test_invalid_epsilon() {
        let mut settings = Settings::default();
        settings.stage.epsilon = 0.0;

        let result = settings.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid epsilon"));

        settings.stage.epsilon = -0.05;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_units() {
        let mut settings = Settings::default();
        settings.stage.units = String::new();

        let result = settings.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("'stage.units' cannot be empty"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[stage]\nid = \"delay_stage\"\nunits = \"mm\"\nepsilon = 0.02"
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.stage.id, "delay_stage");
        assert_eq!(settings.stage.epsilon, 0.02);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        // Figment treats a missing TOML file as an empty provider
        let settings = Settings::load_from("does-not-exist.toml").unwrap();
        assert_eq!(settings.stage.units, "mm");
    }
}
