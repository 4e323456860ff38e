use wasm_bindgen::prelude::*;
use image::DynamicImage;
use js_sys::{Array, Object, Reflect, Uint8Array};
use std::time::Duration;

pub mod color;
pub mod compose;
pub mod config;
pub mod debounce;
pub mod error;
pub mod palette;
pub mod recolor;
pub mod session;

pub use color::{Color, HslComponents, HsvComponents, TextColor};
pub use compose::{Fitted, Placement};
pub use config::{ColorMode, EditorConfig, PaletteSource};
pub use debounce::Debouncer;
pub use error::{EditorError, Result};
pub use palette::{PaletteEntry, Swatch};
pub use session::EditorSession;

// ------------------------------------------------------------
// Byte-level helpers (shared by the wasm exports and the CLI)
// ------------------------------------------------------------

fn decode(input: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(input).map_err(|e| EditorError::decode("<memory>", e))
}

/// Sorted swatches of an encoded image, laid out `per_row` wide.
pub fn swatches_from_bytes(input: &[u8], per_row: usize) -> Result<Vec<Swatch>> {
    let img = decode(input)?;
    let entries = palette::sort(palette::extract(&img));
    Ok(palette::swatches(&entries, per_row))
}

/// Recolor an encoded image and return it as PNG along with the number of
/// pixels changed.
pub fn recolor_bytes(input: &[u8], old_hex: &str, new_hex: &str) -> Result<(Vec<u8>, u64)> {
    let old = Color::from_hex(old_hex)?;
    let new = Color::from_hex(new_hex)?;
    let img = decode(input)?;
    let (out, changed) = recolor::recolor(&img, old, new);
    Ok((session::encode_png(&out)?, changed))
}

/// Fit an encoded image into a transparent box and return the canvas as PNG.
pub fn fit_bytes(input: &[u8], box_width: u32, box_height: u32) -> Result<(Vec<u8>, Placement)> {
    let img = decode(input)?;
    let fitted = compose::fit_to_box(&img, box_width, box_height)?;
    Ok((session::encode_png(&fitted.canvas)?, fitted.placement))
}

// ------------------------------------------------------------
// JS conversions
// ------------------------------------------------------------

fn js_error(e: EditorError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn js_time(now_ms: f64) -> Duration {
    if now_ms.is_finite() && now_ms > 0.0 {
        // overflows past u64 seconds saturate instead of panicking
        Duration::try_from_secs_f64(now_ms / 1000.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn swatch_object(swatch: &Swatch) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &"hex".into(), &JsValue::from_str(&swatch.hex))?;
    Reflect::set(&obj, &"percentage".into(), &JsValue::from_f64(swatch.percentage))?;
    Reflect::set(&obj, &"hue".into(), &JsValue::from_f64(swatch.hue))?;
    Reflect::set(&obj, &"saturation".into(), &JsValue::from_f64(swatch.saturation))?;
    Reflect::set(&obj, &"lightness".into(), &JsValue::from_f64(swatch.lightness))?;
    Reflect::set(
        &obj,
        &"textColor".into(),
        &JsValue::from_str(swatch.text_color.as_str()),
    )?;
    Reflect::set(&obj, &"label".into(), &JsValue::from_str(&swatch.label()))?;
    Reflect::set(&obj, &"row".into(), &JsValue::from_f64(swatch.row as f64))?;
    Reflect::set(&obj, &"column".into(), &JsValue::from_f64(swatch.column as f64))?;
    Ok(obj)
}

fn swatch_array(swatches: &[Swatch]) -> Result<Array, JsValue> {
    let out = Array::new();
    for swatch in swatches {
        out.push(&swatch_object(swatch)?.into());
    }
    Ok(out)
}

// ------------------------------------------------------------
// Stateless exports
// ------------------------------------------------------------

/// Exact palette of an encoded PNG/JPEG, sorted by value then hue.
///
/// Each element is `{hex, percentage, hue, saturation, lightness,
/// textColor, label, row, column}`.
#[wasm_bindgen]
pub fn extract_palette(input: Vec<u8>, per_row: usize) -> Result<Array, JsValue> {
    let swatches = swatches_from_bytes(&input, per_row).map_err(js_error)?;
    swatch_array(&swatches)
}

/// Replace every pixel of `old_hex` with `new_hex`, returning PNG bytes.
#[wasm_bindgen]
pub fn recolor_png(input: Vec<u8>, old_hex: &str, new_hex: &str) -> Result<Uint8Array, JsValue> {
    let (png, _) = recolor_bytes(&input, old_hex, new_hex).map_err(js_error)?;
    Ok(Uint8Array::from(png.as_slice()))
}

/// Centre the image on a transparent `box_width` x `box_height` canvas.
#[wasm_bindgen]
pub fn fit_png(input: Vec<u8>, box_width: u32, box_height: u32) -> Result<Uint8Array, JsValue> {
    let (png, _) = fit_bytes(&input, box_width, box_height).map_err(js_error)?;
    Ok(Uint8Array::from(png.as_slice()))
}

/// `"black"` or `"white"`, whichever reads better on `hex`.
#[wasm_bindgen]
pub fn text_color_for(hex: &str) -> Result<String, JsValue> {
    let color = Color::from_hex(hex).map_err(js_error)?;
    Ok(color.text_color().as_str().to_string())
}

// ------------------------------------------------------------
// Stateful editor
// ------------------------------------------------------------

/// An [`EditorSession`] owned by JavaScript.
#[wasm_bindgen]
pub struct Editor {
    session: EditorSession,
}

#[wasm_bindgen]
impl Editor {
    /// Open PNG/JPEG bytes. `config_json` uses the [`EditorConfig`] fields;
    /// omitted fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(input: Vec<u8>, config_json: Option<String>) -> Result<Editor, JsValue> {
        let config = match config_json {
            Some(json) => EditorConfig::from_json_str(&json).map_err(js_error)?,
            None => EditorConfig::default(),
        };
        let session = EditorSession::open_bytes(&input, config).map_err(js_error)?;
        Ok(Editor { session })
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.session.working().width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.session.working().height()
    }

    pub fn palette(&mut self) -> Result<Array, JsValue> {
        swatch_array(&self.session.swatches())
    }

    /// Returns the number of pixels changed.
    pub fn recolor(&mut self, old_hex: &str, new_hex: &str) -> Result<f64, JsValue> {
        let changed = self
            .session
            .apply_recolor(old_hex, new_hex)
            .map_err(js_error)?;
        Ok(changed as f64)
    }

    pub fn display_png(&self) -> Result<Uint8Array, JsValue> {
        let png = self.session.display_png().map_err(js_error)?;
        Ok(Uint8Array::from(png.as_slice()))
    }

    /// The edited image at its original size, as PNG.
    pub fn export_png(&self) -> Result<Uint8Array, JsValue> {
        let png = self.session.encode_png().map_err(js_error)?;
        Ok(Uint8Array::from(png.as_slice()))
    }

    /// Record a palette-size change made at `now_ms` (e.g. `performance.now()`).
    pub fn request_palette_size(&mut self, now_ms: f64, size: usize) {
        self.session.request_palette_size(js_time(now_ms), size);
    }

    /// The refreshed palette once the quiet window has passed, otherwise
    /// `undefined`.
    pub fn poll(&mut self, now_ms: f64) -> Result<Option<Array>, JsValue> {
        if self.session.poll(js_time(now_ms)).is_none() {
            return Ok(None);
        }
        swatch_array(&self.session.swatches()).map(Some)
    }
}
