//! Reader configuration and data directory resolution

use crate::error::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest accepted `cache_radius`
pub const MAX_CACHE_RADIUS: i64 = 256;

/// Bookmark list ordering exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkOrder {
    /// Most recently bookmarked first
    #[default]
    MostRecentFirst,
    AscendingId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Writable directory holding the installed corpus and settings
    pub data_dir: PathBuf,
    /// Read-only corpus shipped with the application
    pub bundled_asset: PathBuf,
    pub content_file_name: String,
    pub settings_file_name: String,
    /// Hadiths kept on each side of the current one
    pub cache_radius: i64,
    pub min_search_chars: usize,
    pub search_limit: usize,
    /// Number of per-door hadith lists kept in memory
    pub door_cache_capacity: usize,
    pub font_size_min: f32,
    pub font_size_max: f32,
    pub default_font_size: f32,
    pub bookmark_order: BookmarkOrder,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bundled_asset: PathBuf::from("assets/databases/riyad_salheen.db"),
            content_file_name: "riyad_salheen.db".to_string(),
            settings_file_name: "settings.db".to_string(),
            cache_radius: 3,
            min_search_chars: 3,
            search_limit: 100,
            door_cache_capacity: 32,
            font_size_min: 14.0,
            font_size_max: 30.0,
            default_font_size: 18.0,
            bookmark_order: BookmarkOrder::default(),
        }
    }
}

impl ReaderConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: ReaderConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_bundled_asset(mut self, asset: impl Into<PathBuf>) -> Self {
        self.bundled_asset = asset.into();
        self
    }

    pub fn content_path(&self) -> PathBuf {
        self.data_dir.join(&self.content_file_name)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file_name)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_CACHE_RADIUS).contains(&self.cache_radius) {
            return Err(ReaderError::Config(format!(
                "cache_radius must be between 0 and {}, got {}",
                MAX_CACHE_RADIUS, self.cache_radius
            )));
        }
        let sizes = [self.font_size_min, self.font_size_max, self.default_font_size];
        if sizes.iter().any(|size| !size.is_finite()) {
            return Err(ReaderError::Config(
                "font sizes must be finite numbers".to_string(),
            ));
        }
        if self.font_size_min > self.font_size_max {
            return Err(ReaderError::Config(format!(
                "font_size_min {} exceeds font_size_max {}",
                self.font_size_min, self.font_size_max
            )));
        }
        Ok(())
    }

    /// Clamp into `[font_size_min, font_size_max]`. NaN and infinities
    /// fall back to `default_font_size`.
    pub fn clamp_font_size(&self, size: f32) -> f32 {
        let size = if size.is_finite() {
            size
        } else {
            self.default_font_size
        };
        size.clamp(self.font_size_min, self.font_size_max)
    }
}

/// Platform data directory for the installed corpus and settings.
///
/// - macOS/Linux/Windows: `<data dir>/RiyadAlSaliheen`
/// - Fallback: `./data`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("RiyadAlSaliheen"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
