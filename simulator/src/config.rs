//! TOML configuration for the simulator.
//!
//! ```toml
//! [render]
//! pixels_per_cell = 50
//! animation_steps = 10
//! short_frame_ms = 30
//! long_frame_ms = 300
//! margin = 32
//!
//! [output]
//! csv = false
//! csv_path = "karel_world.csv"
//! prompt_before_action = false
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use karel_rendering::RenderConfig;
use karel_system_csv::DEFAULT_CSV_PATH;
use serde::Deserialize;
use thiserror::Error;

/// Complete simulator configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Renderer constants.
    pub render: RenderConfig,
    /// Accessibility outputs.
    pub output: OutputConfig,
}

/// Accessibility outputs enabled from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Writes a CSV snapshot after every command; implies prompting.
    pub csv: bool,
    /// Destination of CSV snapshots.
    pub csv_path: PathBuf,
    /// Waits for a line on standard input before every command.
    pub prompt_before_action: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: false,
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            prompt_before_action: false,
        }
    }
}

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file {}", path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file was not valid configuration TOML.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but cannot be used.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl Config {
    /// Reads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=RenderConfig::MAX_PIXELS_PER_CELL).contains(&self.render.pixels_per_cell) {
            return Err(ConfigError::Invalid(
                "render.pixels_per_cell must be between 1 and 1000",
            ));
        }
        if self.render.margin > RenderConfig::MAX_MARGIN {
            return Err(ConfigError::Invalid("render.margin must be at most 1000"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, Config::default());
        assert_eq!(config.output.csv_path, PathBuf::from("karel_world.csv"));
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml_str(
            "[render]\nanimation_steps = 2\nshort_frame_ms = 5\n\n[output]\ncsv = true\ncsv_path = \"out.csv\"\n",
        )
        .expect("valid config");

        assert_eq!(config.render.animation_steps, 2);
        assert_eq!(config.render.short_frame, Duration::from_millis(5));
        assert_eq!(config.render.long_frame, RenderConfig::DEFAULT_LONG_FRAME);
        assert!(config.output.csv);
        assert_eq!(config.output.csv_path, PathBuf::from("out.csv"));
        assert!(!config.output.prompt_before_action);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = Config::from_toml_str("[output]\ncvs = true\n").expect_err("typo");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        let error =
            Config::from_toml_str("[render]\npixels_per_cell = 0\n").expect_err("zero size");
        assert!(matches!(error, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_render_constants_are_rejected() {
        let error = Config::from_toml_str("[render]\npixels_per_cell = 100000000\n")
            .expect_err("huge cells");
        assert!(matches!(error, ConfigError::Invalid(_)));

        let error =
            Config::from_toml_str("[render]\nmargin = 4000000000\n").expect_err("huge margin");
        assert!(matches!(error, ConfigError::Invalid(_)));

        let config = Config::from_toml_str("[render]\npixels_per_cell = 1000\nmargin = 1000\n")
            .expect("largest accepted values");
        assert_eq!(config.render.pixels_per_cell, RenderConfig::MAX_PIXELS_PER_CELL);
    }
}
