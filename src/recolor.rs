//! Exact-match color substitution.
//!
//! Every pixel whose RGB channels equal the old color gets the new RGB
//! channels; alpha stays as it was. There is no tolerance and no region
//! logic: disconnected areas of the same color are all replaced.

use image::{DynamicImage, ImageBuffer, Pixel};
use tracing::{debug, info};

use crate::color::Color;

/// Rewrite matching pixels of `buf` in place and return how many matched.
///
/// Only the first three channels take part, so this works for both RGB and
/// RGBA buffers. Buffers with fewer than three channels are left untouched.
pub fn recolor_in_place<P>(buf: &mut ImageBuffer<P, Vec<u8>>, old: [u8; 3], new: [u8; 3]) -> u64
where
    P: Pixel<Subpixel = u8>,
{
    if P::CHANNEL_COUNT < 3 {
        return 0;
    }
    let mut matched = 0u64;
    // full scan, no early exit
    for px in buf.pixels_mut() {
        let channels = px.channels_mut();
        if channels[..3] == old {
            channels[..3].copy_from_slice(&new);
            matched += 1;
        }
    }
    matched
}

/// Recolor a copy of `image`, leaving the input untouched.
///
/// Callers swap the returned image in once the pass has finished, so a
/// reader never sees a half-recolored buffer. Returns the new image and the
/// number of pixels that matched `old`.
pub fn recolor(image: &DynamicImage, old: Color, new: Color) -> (DynamicImage, u64) {
    let (old, new) = (old.rgb(), new.rgb());
    let (out, matched) = match image {
        DynamicImage::ImageRgb8(buf) => {
            let mut copy = buf.clone();
            let n = recolor_in_place(&mut copy, old, new);
            (DynamicImage::ImageRgb8(copy), n)
        }
        DynamicImage::ImageRgba8(buf) => {
            let mut copy = buf.clone();
            let n = recolor_in_place(&mut copy, old, new);
            (DynamicImage::ImageRgba8(copy), n)
        }
        other => {
            debug!(color = ?other.color(), "widening image to rgba8 before recolor");
            let mut copy = other.to_rgba8();
            let n = recolor_in_place(&mut copy, old, new);
            (DynamicImage::ImageRgba8(copy), n)
        }
    };
    info!(
        from = %Color::Rgb(old[0], old[1], old[2]),
        to = %Color::Rgb(new[0], new[1], new[2]),
        pixels = matched,
        "recolored image"
    );
    (out, matched)
}
