//! Read-only application configuration.
//!
//! Loaded once at startup from `config.toml` in the app's config directory.
//! The file is optional and never written back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::format::TargetFormat;

pub const APP_DIR_NAME: &str = "bulk_image_converter";
const CONFIG_FILE_NAME: &str = "config.toml";
const ONE_MIB: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_format: TargetFormat,
    /// Same-format re-conversions only run above this effective size.
    pub recompress_threshold_bytes: u64,
    pub archive_name: String,
    pub compression: CompressionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_format: TargetFormat::Jpeg,
            recompress_threshold_bytes: ONE_MIB,
            archive_name: "converted-images.zip".to_string(),
            compression: CompressionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Output size the compressor tries to get under.
    pub max_size_bytes: u64,
    pub initial_quality: u8,
    pub min_quality: u8,
    pub quality_step: u8,
    /// Smallest downscale factor tried for lossless formats.
    pub min_scale: f32,
    pub scale_step: f32,
    /// rav1e speed, 1 (slowest) to 10.
    pub avif_speed: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: ONE_MIB,
            initial_quality: 90,
            min_quality: 40,
            quality_step: 10,
            min_scale: 0.25,
            scale_step: 0.8,
            avif_speed: 8,
        }
    }
}

impl AppConfig {
    /// Loads the config file from the default location.
    ///
    /// A missing file yields defaults silently; an unreadable or invalid one
    /// is logged and also yields defaults.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(err) => {
                tracing::warn!("{err}; using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR_NAME);
        path
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }
}
