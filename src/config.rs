//! Editor settings, loadable from JSON.
//!
//! ```no_run
//! use sprite_recolor_wasm::EditorConfig;
//! use std::path::Path;
//!
//! let config = EditorConfig::from_json_file(Path::new("editor.json"))?;
//! # Ok::<(), sprite_recolor_wasm::EditorError>(())
//! ```
//!
//! Missing fields take their defaults, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{EditorError, Result};

/// Channel layout images are decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Rgb,
    Rgba,
}

/// Which image the palette is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteSource {
    /// The untouched image as opened.
    Source,
    /// The image being edited, including any recolors. Display padding is
    /// left out and pixels are counted at the source resolution.
    Working,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of the display box the working image is fitted into.
    pub display_width: u32,
    pub display_height: u32,
    /// Fit the working image into the display box. The fitted canvas is
    /// always RGBA, whatever `color_mode` says.
    pub fit_to_display: bool,
    pub color_mode: ColorMode,
    pub palette_source: PaletteSource,
    /// Quiet window for palette-size changes, in milliseconds.
    pub debounce_ms: u64,
    pub palette_size: usize,
    pub swatches_per_row: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            display_width: 500,
            display_height: 500,
            fit_to_display: true,
            color_mode: ColorMode::Rgba,
            palette_source: PaletteSource::Working,
            debounce_ms: 300,
            palette_size: 10,
            swatches_per_row: 15,
        }
    }
}

impl EditorConfig {
    /// Settings of the simpler RGB editor: no display fitting and the
    /// palette read from the source image.
    pub fn rgb() -> Self {
        Self {
            fit_to_display: false,
            color_mode: ColorMode::Rgb,
            palette_source: PaletteSource::Source,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|source| EditorError::Config { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| EditorError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.display_width == 0 || self.display_height == 0 {
            return Err(EditorError::InvalidConfig {
                reason: format!(
                    "display box must be non-empty, got {}x{}",
                    self.display_width, self.display_height
                ),
            });
        }
        if self.swatches_per_row == 0 {
            return Err(EditorError::InvalidConfig {
                reason: "swatches_per_row must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
