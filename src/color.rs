//! Color values and the color-space math used to sort and label swatches.
//!
//! A pixel is either RGB or RGBA. Instead of checking tuple lengths at run
//! time, the two shapes are variants of [`Color`], and every comparison that
//! must ignore alpha goes through [`Color::rgb`].

use palette::{FromColor, Hsl, Hsv, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EditorError, Result};

/// Luminance above which a swatch label switches to black text.
pub const LIGHT_LUMINANCE_THRESHOLD: f64 = 0.6;

/// An exact 8-bit pixel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, u8),
}

impl Color {
    /// Red, green and blue channels, dropping alpha.
    pub fn rgb(&self) -> [u8; 3] {
        match *self {
            Color::Rgb(r, g, b) | Color::Rgba(r, g, b, _) => [r, g, b],
        }
    }

    /// True when both colors have the same RGB channels, whatever their alpha.
    pub fn same_rgb(&self, other: &Color) -> bool {
        self.rgb() == other.rgb()
    }

    /// Keep this color's alpha (if any) but take the RGB channels of `rgb`.
    pub fn with_rgb(&self, rgb: [u8; 3]) -> Color {
        let [r, g, b] = rgb;
        match *self {
            Color::Rgb(..) => Color::Rgb(r, g, b),
            Color::Rgba(.., a) => Color::Rgba(r, g, b, a),
        }
    }

    /// `#rrggbb`, alpha is never encoded.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Parse `#rrggbb` (the leading `#` is optional) into an RGB color.
    pub fn from_hex(value: &str) -> Result<Color> {
        let invalid = || EditorError::InvalidHex {
            value: value.to_string(),
        };
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?;
        let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?;
        let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?;
        Ok(Color::Rgb(r, g, b))
    }

    pub fn hsv(&self) -> HsvComponents {
        let [r, g, b] = self.rgb();
        rgb_to_hsv(r, g, b)
    }

    pub fn hsl(&self) -> HslComponents {
        let [r, g, b] = self.rgb();
        rgb_to_hsl(r, g, b)
    }

    /// Label color that stays readable on top of this color.
    pub fn text_color(&self) -> TextColor {
        let [r, g, b] = self.rgb();
        if is_too_light(r, g, b) {
            TextColor::Black
        } else {
            TextColor::White
        }
    }
}

impl TryFrom<&[u8]> for Color {
    type Error = EditorError;

    fn try_from(channels: &[u8]) -> Result<Color> {
        match *channels {
            [r, g, b] => Ok(Color::Rgb(r, g, b)),
            [r, g, b, a] => Ok(Color::Rgba(r, g, b, a)),
            _ => Err(EditorError::InvalidColorEntry {
                channels: channels.to_vec(),
            }),
        }
    }
}

impl FromStr for Color {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Color> {
        Color::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// HSV with every component in `[0, 1]` (hue in `[0, 1)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvComponents {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

/// HSL in display units, each rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HslComponents {
    /// Degrees, `[0, 360]`.
    pub hue: f64,
    /// Percent, `[0, 100]`.
    pub saturation: f64,
    /// Percent, `[0, 100]`.
    pub lightness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextColor {
    Black,
    White,
}

impl TextColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextColor::Black => "black",
            TextColor::White => "white",
        }
    }
}

fn srgb(r: u8, g: u8, b: u8) -> Srgb<f32> {
    Srgb::<u8>::new(r, g, b).into_format::<f32>()
}

fn round1(x: f32) -> f64 {
    (f64::from(x) * 10.0).round() / 10.0
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> HsvComponents {
    let hsv: Hsv = Hsv::from_color(srgb(r, g, b));
    let hue = hsv.hue.into_positive_degrees() / 360.0;
    HsvComponents {
        // f32 rounding can land exactly on a full turn
        hue: if hue >= 1.0 { 0.0 } else { hue },
        saturation: hsv.saturation,
        value: hsv.value,
    }
}

pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> HslComponents {
    let hsl: Hsl = Hsl::from_color(srgb(r, g, b));
    HslComponents {
        hue: round1(hsl.hue.into_positive_degrees()),
        saturation: round1(hsl.saturation * 100.0),
        lightness: round1(hsl.lightness * 100.0),
    }
}

/// Perceived brightness in `[0, 1]` using the Rec. 601 luma weights.
pub fn perceived_luminance(r: u8, g: u8, b: u8) -> f64 {
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0
}

pub fn is_too_light(r: u8, g: u8, b: u8) -> bool {
    perceived_luminance(r, g, b) > LIGHT_LUMINANCE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn hex_round_trips_lowercase() {
        let c = Color::from_hex("#FF8000").unwrap();
        assert_eq!(c, Color::Rgb(255, 128, 0));
        assert_eq!(c.to_hex(), "#ff8000");
        assert_eq!(Color::from_hex("0a0b0c").unwrap(), Color::Rgb(10, 11, 12));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        for bad in ["", "#fff", "#gggggg", "#1234567", "#12é45"] {
            assert!(
                matches!(Color::from_hex(bad), Err(EditorError::InvalidHex { .. })),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn rgba_hex_ignores_alpha() {
        assert_eq!(Color::Rgba(1, 2, 3, 0).to_hex(), "#010203");
    }

    #[test]
    fn same_rgb_ignores_alpha() {
        let a = Color::Rgba(10, 20, 30, 255);
        let b = Color::Rgba(10, 20, 30, 7);
        assert!(a.same_rgb(&b));
        assert!(a.same_rgb(&Color::Rgb(10, 20, 30)));
        assert_ne!(a, b);
    }

    #[test]
    fn with_rgb_keeps_alpha() {
        let c = Color::Rgba(1, 1, 1, 42).with_rgb([9, 8, 7]);
        assert_eq!(c, Color::Rgba(9, 8, 7, 42));
    }

    #[test]
    fn channel_slices_convert_by_length() {
        assert_eq!(Color::try_from(&[1u8, 2, 3][..]).unwrap(), Color::Rgb(1, 2, 3));
        assert_eq!(
            Color::try_from(&[1u8, 2, 3, 4][..]).unwrap(),
            Color::Rgba(1, 2, 3, 4)
        );
        assert!(Color::try_from(&[1u8, 2][..]).is_err());
        assert!(Color::try_from(&[1u8, 2, 3, 4, 5][..]).is_err());
    }

    #[test]
    fn hsv_of_primaries() {
        let red = rgb_to_hsv(255, 0, 0);
        assert!(close(red.hue, 0.0) && close(red.saturation, 1.0) && close(red.value, 1.0));

        let green = rgb_to_hsv(0, 255, 0);
        assert!(close(green.hue, 1.0 / 3.0));

        let blue = rgb_to_hsv(0, 0, 255);
        assert!(close(blue.hue, 2.0 / 3.0));
    }

    #[test]
    fn hsv_of_grays_has_no_hue() {
        let black = rgb_to_hsv(0, 0, 0);
        assert_eq!(black.hue, 0.0);
        assert_eq!(black.saturation, 0.0);
        assert_eq!(black.value, 0.0);

        let gray = rgb_to_hsv(128, 128, 128);
        assert_eq!(gray.hue, 0.0);
        assert!(close(gray.value, 128.0 / 255.0));
    }

    #[test]
    fn hsl_is_rounded_to_one_decimal() {
        let c = rgb_to_hsl(255, 0, 0);
        assert_eq!((c.hue, c.saturation, c.lightness), (0.0, 100.0, 50.0));

        let c = rgb_to_hsl(51, 102, 204);
        assert_eq!(c.hue, 220.0);
        assert_eq!(c.saturation, 60.0);
        assert_eq!(c.lightness, 50.0);

        let white = rgb_to_hsl(255, 255, 255);
        assert_eq!((white.saturation, white.lightness), (0.0, 100.0));
    }

    #[test]
    fn luminance_picks_label_color() {
        assert_eq!(perceived_luminance(0, 0, 0), 0.0);
        assert!((perceived_luminance(255, 255, 255) - 1.0).abs() < 1e-9);
        assert_eq!(Color::Rgb(255, 255, 0).text_color(), TextColor::Black);
        assert_eq!(Color::Rgb(0, 0, 255).text_color(), TextColor::White);
        // 0.587 * 255 / 255 is below the threshold
        assert!(!is_too_light(0, 255, 0));
        assert_eq!(TextColor::White.as_str(), "white");
    }
}
