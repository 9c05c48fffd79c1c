//! Style Configuration - defaults and asset location loaded from JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::color::ColorValue;
use crate::validation::{run_checks, OptionsError, QR_MARGIN_CHECKS, SIZE_CHECKS};
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config default: {0}")]
    InvalidDefault(#[from] OptionsError),

    #[error("Config requires engine >= {required}, current is {current}")]
    EngineVersionMismatch { required: String, current: String },

    #[error("Invalid version string: {0}")]
    Version(#[from] semver::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleConfig {
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,
    #[serde(default = "default_size")]
    pub default_size: u32,
    #[serde(default = "default_margin")]
    pub default_margin: u32,
    #[serde(default = "default_foreground")]
    pub default_foreground: ColorValue,
    #[serde(default = "default_background")]
    pub default_background: ColorValue,
    #[serde(default = "default_engine_min_version")]
    pub engine_min_version: String,
}

fn default_asset_root() -> PathBuf { PathBuf::from("assets") }
fn default_size() -> u32 { 300 }
fn default_margin() -> u32 { 10 }
fn default_foreground() -> ColorValue { ColorValue::BLACK }
fn default_background() -> ColorValue { ColorValue::WHITE }
fn default_engine_min_version() -> String { "1.0.0".to_string() }

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            default_size: default_size(),
            default_margin: default_margin(),
            default_foreground: default_foreground(),
            default_background: default_background(),
            engine_min_version: default_engine_min_version(),
        }
    }
}

impl StyleConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), asset_root = %config.asset_root.display(), "loaded style config");
        Ok(config)
    }

    /// Relative asset roots are resolved against the config file's directory.
    pub fn load_relative(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        if config.asset_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.asset_root = dir.join(&config.asset_root);
            }
        }
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: StyleConfig = serde_json::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Defaults go through the same checks as the setters they seed.
    pub fn check(&self) -> Result<(), ConfigError> {
        run_checks("size", &(self.default_size as i64), SIZE_CHECKS)?;
        run_checks("margin", &(self.default_margin as i64), QR_MARGIN_CHECKS)?;
        self.check_engine_version()
    }

    fn check_engine_version(&self) -> Result<(), ConfigError> {
        let engine_ver = semver::Version::parse(ENGINE_VERSION)?;
        let min_ver = semver::Version::parse(&self.engine_min_version)?;

        if engine_ver < min_ver {
            return Err(ConfigError::EngineVersionMismatch {
                required: self.engine_min_version.clone(),
                current: ENGINE_VERSION.to_string(),
            });
        }
        Ok(())
    }
}
