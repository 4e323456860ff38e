//! Fitting images into a fixed display box and back.
//!
//! Scaling always uses nearest-neighbour sampling so that hard pixel edges
//! survive; no smoothing is ever applied.

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage, imageops::FilterType};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Where the scaled image sits inside the display canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A box-sized RGBA canvas and the rectangle holding the actual image.
#[derive(Debug, Clone)]
pub struct Fitted {
    pub canvas: DynamicImage,
    pub placement: Placement,
}

/// Size of `(width, height)` scaled to fit `(box_width, box_height)` with its
/// aspect ratio kept. The result is at least 1x1 and never exceeds the box.
pub fn fitted_size(width: u32, height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    let img_aspect = f64::from(width) / f64::from(height);
    let box_aspect = f64::from(box_width) / f64::from(box_height);

    let (w, h) = if img_aspect > box_aspect {
        // wider than the box: fit to width
        (box_width, (f64::from(box_width) / img_aspect).round() as u32)
    } else {
        (
            (f64::from(box_height) * img_aspect).round() as u32,
            box_height,
        )
    };
    (w.clamp(1, box_width), h.clamp(1, box_height))
}

/// Scale `image` into a transparent `box_width` x `box_height` canvas,
/// centered.
///
/// The canvas is always exactly the box size; any area the image does not
/// cover is `(0, 0, 0, 0)`.
pub fn fit_to_box(image: &DynamicImage, box_width: u32, box_height: u32) -> Result<Fitted> {
    if box_width == 0 || box_height == 0 {
        return Err(EditorError::InvalidDimensions {
            width: box_width,
            height: box_height,
        });
    }
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EditorError::InvalidDimensions { width, height });
    }

    let (new_w, new_h) = fitted_size(width, height, box_width, box_height);
    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Nearest);

    let placement = Placement {
        x: (box_width - new_w) / 2,
        y: (box_height - new_h) / 2,
        width: new_w,
        height: new_h,
    };
    let mut canvas = RgbaImage::from_pixel(box_width, box_height, Rgba([0, 0, 0, 0]));
    // paste, not blend: the scaled pixels replace the transparent ones
    image::imageops::replace(
        &mut canvas,
        &resized,
        i64::from(placement.x),
        i64::from(placement.y),
    );

    Ok(Fitted {
        canvas: DynamicImage::ImageRgba8(canvas),
        placement,
    })
}

/// Undo [`fit_to_box`]: drop the padding and scale back to `(width, height)`.
///
/// With no placement the whole canvas is scaled. The output dimensions are
/// always exact, but pixel content is only recovered bit for bit when the
/// display scale was a whole-number factor; otherwise nearest-neighbour
/// resampling may duplicate or drop rows and columns.
pub fn restore_original_size(
    canvas: &DynamicImage,
    placement: Option<Placement>,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(EditorError::InvalidDimensions { width, height });
    }
    let content = match placement {
        Some(p) => canvas.crop_imm(p.x, p.y, p.width, p.height),
        None => canvas.clone(),
    };
    Ok(image::imageops::resize(
        &content,
        width,
        height,
        FilterType::Nearest,
    ))
}
