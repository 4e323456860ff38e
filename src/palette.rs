//! Exact palette extraction and perceptual ordering.
//!
//! Colors are counted exactly, never binned or clustered. Counting goes
//! through an ordered map, so the cost is `O(N log D)` for `N` pixels and
//! `D` distinct colors, and memory grows with `D`. That is fine for sprites
//! and pixel art; a photograph with hundreds of thousands of distinct
//! colors will produce a palette of the same size.

use image::DynamicImage;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::color::{Color, TextColor};

/// One distinct color and the share of the image it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaletteEntry {
    pub color: Color,
    pub pixel_count: u64,
    /// `100 * pixel_count / total`, rounded to two decimals.
    pub percentage: f64,
}

impl PaletteEntry {
    pub fn new(color: Color, percentage: f64) -> Self {
        Self {
            color,
            pixel_count: 0,
            percentage,
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// Keys are compared as raw channel arrays, which yields entries in
// ascending tuple order. The sorter relies on that for its tie-break.
fn count_exact<const N: usize>(raw: &[u8]) -> BTreeMap<[u8; N], u64> {
    let mut counts = BTreeMap::new();
    for chunk in raw.chunks_exact(N) {
        let mut key = [0u8; N];
        key.copy_from_slice(chunk);
        *counts.entry(key).or_insert(0u64) += 1;
    }
    counts
}

fn entries_from_counts<const N: usize>(
    counts: BTreeMap<[u8; N], u64>,
    total: u64,
) -> Vec<PaletteEntry> {
    counts
        .into_iter()
        .filter_map(|(key, count)| {
            let color = Color::try_from(&key[..]).ok()?;
            Some(PaletteEntry {
                color,
                pixel_count: count,
                percentage: round2(100.0 * count as f64 / total as f64),
            })
        })
        .collect()
}

/// Every distinct pixel value of `image` with its coverage.
///
/// RGB images yield [`Color::Rgb`] entries, RGBA images [`Color::Rgba`]
/// entries (so two pixels differing only in alpha are distinct colors).
/// Other pixel formats are widened to RGBA first.
pub fn extract(image: &DynamicImage) -> Vec<PaletteEntry> {
    let total = u64::from(image.width()) * u64::from(image.height());
    if total == 0 {
        return Vec::new();
    }

    let entries = match image {
        DynamicImage::ImageRgb8(buf) => entries_from_counts(count_exact::<3>(buf), total),
        DynamicImage::ImageRgba8(buf) => entries_from_counts(count_exact::<4>(buf), total),
        other => entries_from_counts(count_exact::<4>(&other.to_rgba8()), total),
    };

    info!(
        width = image.width(),
        height = image.height(),
        colors = entries.len(),
        "extracted palette"
    );
    entries
}

// Both components are non-negative, where the IEEE bit pattern orders the
// same way as the float. Adding 0.0 folds -0.0 into +0.0.
fn sort_key(color: &Color) -> (u32, u32) {
    let hsv = color.hsv();
    ((hsv.value + 0.0).to_bits(), (hsv.hue + 0.0).to_bits())
}

/// Order entries by HSV value, then hue, both ascending.
///
/// The sort is stable, so entries with equal keys keep the order they came
/// in; for [`extract`] output that is ascending raw channel order.
pub fn sort(mut entries: Vec<PaletteEntry>) -> Vec<PaletteEntry> {
    entries.sort_by_cached_key(|entry| sort_key(&entry.color));
    entries
}

/// Like [`sort`], for entries whose colors arrive as loose channel lists.
///
/// Lists that are not three or four channels long are logged and dropped.
pub fn sort_raw<I, C>(entries: I) -> Vec<PaletteEntry>
where
    I: IntoIterator<Item = (C, f64)>,
    C: AsRef<[u8]>,
{
    let valid = entries
        .into_iter()
        .filter_map(|(channels, percentage)| match Color::try_from(channels.as_ref()) {
            Ok(color) => Some(PaletteEntry::new(color, percentage)),
            Err(err) => {
                warn!(%err, "skipping palette entry");
                None
            }
        })
        .collect();
    sort(valid)
}

/// Everything a UI needs to draw one palette entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Swatch {
    pub color: Color,
    pub hex: String,
    pub percentage: f64,
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    pub text_color: TextColor,
    pub row: usize,
    pub column: usize,
}

impl Swatch {
    pub fn label(&self) -> String {
        format!("H:{}\nS:{}\nL:{}", self.hue, self.saturation, self.lightness)
    }
}

/// Lay sorted entries out on a grid `per_row` swatches wide.
pub fn swatches(entries: &[PaletteEntry], per_row: usize) -> Vec<Swatch> {
    let per_row = per_row.max(1);
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let hsl = entry.color.hsl();
            Swatch {
                color: entry.color,
                hex: entry.color.to_hex(),
                percentage: entry.percentage,
                hue: hsl.hue,
                saturation: hsl.saturation,
                lightness: hsl.lightness,
                text_color: entry.color.text_color(),
                row: index / per_row,
                column: index % per_row,
            }
        })
        .collect()
}
