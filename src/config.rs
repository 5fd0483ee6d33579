//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/finter/finter.toml`
//! 3. Local config: `<dir>/.finter.toml`
//! 4. Environment variables: `FINTER_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::error::CliError;
use crate::coverage::{CoverageOptions, DegeneratePolicy};

/// Unified configuration for finter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Synthesize fragment nodes for unclaimed bytes (default: true)
    pub fill_gaps: bool,
    /// Handling of zero-length tags (default: reject)
    pub degenerate: DegeneratePolicy,
    /// How fragments are labelled in rendered output (default: "fragment")
    pub fragment_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fill_gaps: true,
            degenerate: DegeneratePolicy::Reject,
            fragment_label: "fragment".into(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "inherit").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub fill_gaps: Option<bool>,
    pub degenerate: Option<DegeneratePolicy>,
    pub fragment_label: Option<String>,
}

/// Get the XDG config directory for finter.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "finter").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("finter.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".finter.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| CliError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> CliError {
    CliError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            fill_gaps: overlay.fill_gaps.unwrap_or(self.fill_gaps),
            degenerate: overlay.degenerate.unwrap_or(self.degenerate),
            fragment_label: overlay
                .fragment_label
                .clone()
                .unwrap_or_else(|| self.fragment_label.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.finter.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, CliError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("local config: {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply FINTER_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, CliError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("FINTER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        match config.get_bool("fill_gaps") {
            Ok(val) => settings.fill_gaps = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => {
                return Err(CliError::Config {
                    message: format!("FINTER_FILL_GAPS: {e}"),
                })
            }
        }
        if let Ok(val) = config.get_string("degenerate") {
            settings.degenerate = match val.to_ascii_lowercase().as_str() {
                "reject" => DegeneratePolicy::Reject,
                "skip" => DegeneratePolicy::Skip,
                other => {
                    return Err(CliError::Config {
                        message: format!("FINTER_DEGENERATE: expected reject|skip, got {other:?}"),
                    })
                }
            };
        }
        if let Ok(val) = config.get_string("fragment_label") {
            settings.fragment_label = val;
        }

        Ok(settings)
    }

    /// Library-level options for the coverage builder.
    pub fn coverage_options(&self) -> CoverageOptions {
        CoverageOptions {
            fill_gaps: self.fill_gaps,
            degenerate: self.degenerate,
        }
    }

    /// Serialize to TOML for `config show`.
    pub fn to_toml(&self) -> Result<String, CliError> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config {
            message: e.to_string(),
        })
    }
}
