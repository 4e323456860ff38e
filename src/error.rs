//! Error types shared by every editor operation.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = EditorError> = std::result::Result<T, E>;

/// Everything that can go wrong while opening, editing or exporting an image.
///
/// None of these abort the session: an operation that fails leaves the
/// source and working images exactly as they were before the call.
#[derive(Error, Debug)]
pub enum EditorError {
    /// The file is missing, has an unsupported extension, or cannot be decoded.
    #[error("failed to load image {path}: {reason}")]
    ImageLoad {
        path: String,
        reason: String,
        #[source]
        source: Option<image::ImageError>,
    },

    /// Writing the exported PNG failed.
    #[error("failed to save image to {}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A palette entry whose channel list is neither RGB nor RGBA.
    #[error("invalid color entry: expected 3 or 4 channels, got {channels:?}")]
    InvalidColorEntry { channels: Vec<u8> },

    /// A color string that is not `#rrggbb`.
    #[error("invalid hex color {value:?}")]
    InvalidHex { value: String },

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to parse configuration")]
    Config {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read configuration {}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EditorError {
    pub(crate) fn image_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImageLoad {
            path: path.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn decode(path: impl Into<String>, source: image::ImageError) -> Self {
        Self::ImageLoad {
            path: path.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// Whether a caller may keep using its session after this error.
    ///
    /// Configuration errors happen before a session exists, so only they
    /// are reported as unrecoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            EditorError::InvalidConfig { .. } | EditorError::Config { .. } | EditorError::ConfigIo { .. }
        )
    }

    /// Short message suitable for a status bar.
    pub fn user_message(&self) -> String {
        match self {
            EditorError::ImageLoad { .. } => {
                "Could not open the image. Only PNG and JPEG files are supported.".to_string()
            }
            EditorError::Save { .. } => "Could not save the image.".to_string(),
            EditorError::InvalidHex { value } => format!("{value} is not a #rrggbb color."),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_are_recoverable() {
        let err = EditorError::image_load("a.gif", "unsupported format");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("a.gif"));
    }

    #[test]
    fn config_errors_are_not_recoverable() {
        let err = EditorError::InvalidConfig {
            reason: "zero width".into(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn invalid_hex_message_names_the_value() {
        let err = EditorError::InvalidHex {
            value: "#12".into(),
        };
        assert_eq!(err.user_message(), "#12 is not a #rrggbb color.");
    }
}
