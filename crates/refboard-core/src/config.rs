//! User settings: background, grid and language.

use peniko::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest allowed grid spacing in world units.
pub const MIN_GRID_SIZE: u32 = 10;
/// Largest allowed grid spacing in world units.
pub const MAX_GRID_SIZE: u32 = 200;

const SETTINGS_FILE: &str = "settings.json";

/// Settings load/save errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no config directory on this platform")]
    NoConfigDir,
}

/// Serializable color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "zh_cn")]
    ZhCn,
    #[serde(rename = "en")]
    En,
}

/// Board appearance settings. Read-only input to rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub language: Language,
    pub background_color: SerializableColor,
    pub grid_color: SerializableColor,
    /// Grid spacing in world units, within `[MIN_GRID_SIZE, MAX_GRID_SIZE]`.
    pub grid_size: u32,
    pub grid_enabled: bool,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            language: Language::ZhCn,
            background_color: SerializableColor::rgb(40, 40, 40),
            grid_color: SerializableColor::rgb(60, 60, 60),
            grid_size: 40,
            grid_enabled: true,
        }
    }
}

impl BoardSettings {
    /// Default settings file under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("refboard").join(SETTINGS_FILE))
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&json)?;
        settings.set_grid_size(settings.grid_size);
        Ok(settings)
    }

    /// Load from the default location, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings as JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Save to the default location.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save(&path)
    }

    /// Set the grid spacing, clamped to the allowed range.
    pub fn set_grid_size(&mut self, size: u32) {
        self.grid_size = size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
    }

    pub fn reset_defaults(&mut self) {
        *self = Self::default();
    }

    pub fn background(&self) -> Color {
        self.background_color.into()
    }

    pub fn grid(&self) -> Color {
        self.grid_color.into()
    }
}
