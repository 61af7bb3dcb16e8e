/// Board configuration
///
/// Loaded once at startup from `<config_dir>/tier-board/config.json`.
/// The tier list read here is fixed for the lifetime of the board.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Accepted range for `thumbnail_size`, in pixels
pub const MIN_THUMBNAIL_SIZE: u32 = 16;
pub const MAX_THUMBNAIL_SIZE: u32 = 512;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("config must declare at least one tier")]
    NoTiers,
}

/// One tier row: its label and row color
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TierConfig {
    pub label: String,
    pub color: [u8; 3],
}

impl TierConfig {
    pub fn new(label: &str, color: [u8; 3]) -> Self {
        Self {
            label: label.to_string(),
            color,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    /// Tier rows, top to bottom
    pub tiers: Vec<TierConfig>,
    /// Edge of an item cell in pixels (UI and export)
    pub thumbnail_size: u32,
    /// Suggested name of the exported image
    pub export_file_name: String,
    /// Lowercase file extensions accepted by the picker and external drops
    pub image_extensions: Vec<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierConfig::new("S", [0xff, 0x7f, 0x7f]),
                TierConfig::new("A", [0xff, 0xbf, 0x7f]),
                TierConfig::new("B", [0xff, 0xdf, 0x7f]),
                TierConfig::new("C", [0xff, 0xff, 0x7f]),
                TierConfig::new("D", [0xbf, 0xff, 0x7f]),
                TierConfig::new("E", [0x7f, 0xff, 0x7f]),
            ],
            thumbnail_size: 100,
            export_file_name: "tier.png".to_string(),
            image_extensions: ["png", "jpg", "jpeg", "gif", "webp", "bmp", "ico", "tiff"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl BoardConfig {
    /// Default location of the config file
    ///
    /// - Linux: ~/.config/tier-board/config.json
    /// - macOS: ~/Library/Application Support/tier-board/config.json
    /// - Windows: %APPDATA%\tier-board\config.json
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("tier-board");
        path.push("config.json");
        Some(path)
    }

    /// Read a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut config: BoardConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.tiers.is_empty() {
            return Err(ConfigError::NoTiers);
        }

        let clamped = config.thumbnail_size.clamp(MIN_THUMBNAIL_SIZE, MAX_THUMBNAIL_SIZE);
        if clamped != config.thumbnail_size {
            tracing::warn!(
                "thumbnail_size {} out of range, using {}",
                config.thumbnail_size,
                clamped
            );
            config.thumbnail_size = clamped;
        }
        Ok(config)
    }

    /// Load from the default location, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            tracing::warn!("No config directory available, using default tiers");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded {} tiers from {}", config.tiers.len(), path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Whether a path's extension is an accepted image type
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.image_extensions.iter().any(|accepted| *accepted == ext))
    }
}
