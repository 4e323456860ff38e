//! The editing session: one opened image, its working copy and palette.
//!
//! A session is created by opening a file (or bytes) and owned by the
//! caller; opening another image means building a new session, so a failed
//! open leaves the previous one untouched.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::color::Color;
use crate::compose::{self, Placement};
use crate::config::{ColorMode, EditorConfig, PaletteSource};
use crate::debounce::Debouncer;
use crate::error::{EditorError, Result};
use crate::palette::{self, PaletteEntry, Swatch};
use crate::recolor;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Source image, working image and the lazily computed palette.
///
/// The source never changes after opening. The working image is replaced
/// wholesale by each recolor, and the cached palette is dropped at the same
/// time so the next [`EditorSession::palette`] call recomputes it.
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    path: Option<PathBuf>,
    source: DynamicImage,
    working: DynamicImage,
    placement: Option<Placement>,
    palette: Option<Vec<PaletteEntry>>,
    palette_size: usize,
    refresh: Debouncer<usize>,
}

impl EditorSession {
    /// Open a PNG or JPEG file.
    pub fn open_image(path: &Path, config: EditorConfig) -> Result<Self> {
        let shown = path.display().to_string();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !supported {
            return Err(EditorError::image_load(shown, "unsupported file type"));
        }

        let decoded = image::open(path).map_err(|e| EditorError::decode(shown, e))?;
        let mut session = Self::from_decoded(decoded, config)?;
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    /// Open an in-memory PNG or JPEG.
    pub fn open_bytes(bytes: &[u8], config: EditorConfig) -> Result<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Png) | Ok(ImageFormat::Jpeg) => {}
            Ok(other) => {
                return Err(EditorError::image_load(
                    "<memory>",
                    format!("unsupported format {other:?}"),
                ));
            }
            Err(e) => return Err(EditorError::decode("<memory>", e)),
        }
        let decoded =
            image::load_from_memory(bytes).map_err(|e| EditorError::decode("<memory>", e))?;
        Self::from_decoded(decoded, config)
    }

    /// Start a session from an already decoded image.
    pub fn from_decoded(decoded: DynamicImage, config: EditorConfig) -> Result<Self> {
        config.validate()?;

        let source = match config.color_mode {
            ColorMode::Rgb => DynamicImage::ImageRgb8(decoded.to_rgb8()),
            ColorMode::Rgba => DynamicImage::ImageRgba8(decoded.to_rgba8()),
        };

        let (working, placement) = if config.fit_to_display {
            let fitted =
                compose::fit_to_box(&source, config.display_width, config.display_height)?;
            (fitted.canvas, Some(fitted.placement))
        } else {
            (source.clone(), None)
        };

        info!(
            source_width = source.width(),
            source_height = source.height(),
            working_width = working.width(),
            working_height = working.height(),
            "image loaded"
        );

        Ok(Self {
            palette_size: config.palette_size,
            refresh: Debouncer::new(config.debounce()),
            config,
            path: None,
            source,
            working,
            placement,
            palette: None,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// File the session was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn working(&self) -> &DynamicImage {
        &self.working
    }

    /// Where the image sits on the display canvas, when it was fitted.
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn original_size(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    pub fn palette_size(&self) -> usize {
        self.palette_size
    }

    /// Sorted palette of the configured image, recomputed if stale.
    ///
    /// The working palette is counted on the edited pixels at source
    /// resolution, so display padding and upscaling never show up in it.
    pub fn palette(&mut self) -> &[PaletteEntry] {
        if self.palette.is_none() {
            let extracted = match self.config.palette_source {
                PaletteSource::Source => palette::extract(&self.source),
                PaletteSource::Working => palette::extract(&self.unpadded_working()),
            };
            self.palette = Some(palette::sort(extracted));
        }
        self.palette.as_deref().unwrap_or(&[])
    }

    // Working pixels cropped to the placement and scaled back to the source
    // size, in the source's color type.
    fn unpadded_working(&self) -> Cow<'_, DynamicImage> {
        if self.placement.is_none() {
            return Cow::Borrowed(&self.working);
        }
        let (width, height) = self.original_size();
        match compose::restore_original_size(&self.working, self.placement, width, height) {
            Ok(restored) => Cow::Owned(match self.source {
                DynamicImage::ImageRgb8(_) => {
                    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(restored).to_rgb8())
                }
                _ => DynamicImage::ImageRgba8(restored),
            }),
            Err(err) => {
                warn!(%err, "palette falls back to the padded working image");
                Cow::Borrowed(&self.working)
            }
        }
    }

    pub fn swatches(&mut self) -> Vec<Swatch> {
        let per_row = self.config.swatches_per_row;
        palette::swatches(self.palette(), per_row)
    }

    /// Replace every working pixel of color `old_hex` with `new_hex`.
    ///
    /// Both colors are parsed before anything is touched, and the recolor
    /// runs on a copy that is swapped in afterwards, so an error leaves the
    /// working image as it was. Returns the number of pixels changed.
    pub fn apply_recolor(&mut self, old_hex: &str, new_hex: &str) -> Result<u64> {
        let old = Color::from_hex(old_hex)?;
        let new = Color::from_hex(new_hex)?;
        Ok(self.apply_recolor_color(old, new))
    }

    /// [`EditorSession::apply_recolor`] for already parsed colors. Alpha on
    /// either argument is ignored.
    pub fn apply_recolor_color(&mut self, old: Color, new: Color) -> u64 {
        let (recolored, changed) = recolor::recolor(&self.working, old, new);
        self.working = recolored;
        self.palette = None;
        changed
    }

    /// Ask for a palette refresh after the user changed the palette size.
    ///
    /// Rapid changes collapse into one refresh; see [`EditorSession::poll`].
    pub fn request_palette_size(&mut self, now: Duration, size: usize) -> u64 {
        self.refresh.request(now, size)
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.refresh.is_pending()
    }

    /// Run the pending palette refresh if its quiet window has passed,
    /// returning the freshly extracted palette.
    pub fn poll(&mut self, now: Duration) -> Option<Vec<PaletteEntry>> {
        let size = self.refresh.poll(now)?;
        self.palette_size = size;
        self.palette = None;
        Some(self.palette().to_vec())
    }

    /// The working image scaled back to the source dimensions, padding
    /// removed.
    pub fn export_buffer(&self) -> Result<DynamicImage> {
        let (width, height) = self.original_size();
        let restored =
            compose::restore_original_size(&self.working, self.placement, width, height)?;
        Ok(DynamicImage::ImageRgba8(restored))
    }

    /// Write the edited image as an RGBA PNG at the source dimensions.
    pub fn export_image(&self, dest: &Path) -> Result<()> {
        let out = self.export_buffer()?;
        out.save_with_format(dest, ImageFormat::Png)
            .map_err(|source| EditorError::Save {
                path: dest.to_path_buf(),
                source,
            })?;
        info!(
            path = %dest.display(),
            width = out.width(),
            height = out.height(),
            "image saved"
        );
        Ok(())
    }

    /// PNG bytes of [`EditorSession::export_buffer`].
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.export_buffer()?)
    }

    /// PNG bytes of the working image as displayed, padding included.
    pub fn display_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.working)
    }
}

pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|source| EditorError::Save {
            path: PathBuf::from("<memory>"),
            source,
        })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn scenario() -> DynamicImage {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 255, 0]));
        img.put_pixel(1, 1, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn rgb_session_keeps_the_source_shape() {
        let mut session = EditorSession::from_decoded(scenario(), EditorConfig::rgb()).unwrap();
        assert_eq!(session.working().dimensions(), (2, 2));
        assert!(session.placement().is_none());
        let palette: Vec<(Color, f64)> = session
            .palette()
            .iter()
            .map(|e| (e.color, e.percentage))
            .collect();
        assert_eq!(palette.len(), 3);
        assert!(palette.contains(&(Color::Rgb(255, 0, 0), 50.0)));
        assert!(palette.contains(&(Color::Rgb(0, 255, 0), 25.0)));
        assert!(palette.contains(&(Color::Rgb(0, 0, 255), 25.0)));
    }

    #[test]
    fn recolor_scenario() {
        let config = EditorConfig {
            palette_source: PaletteSource::Working,
            ..EditorConfig::rgb()
        };
        let mut session = EditorSession::from_decoded(scenario(), config).unwrap();
        let changed = session.apply_recolor("#ff0000", "#000000").unwrap();
        assert_eq!(changed, 2);
        assert_eq!(
            session.working().to_rgb8().into_raw(),
            vec![0, 0, 0, 0, 0, 0, 0, 255, 0, 0, 0, 255]
        );
        // the cached palette was invalidated
        assert!(session
            .palette()
            .iter()
            .any(|e| e.color == Color::Rgb(0, 0, 0) && e.percentage == 50.0));
        // the source stays as opened
        assert_eq!(session.source().to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn bad_hex_leaves_working_image_alone() {
        let mut session = EditorSession::from_decoded(scenario(), EditorConfig::rgb()).unwrap();
        let before = session.working().clone();
        let err = session.apply_recolor("#ff0000", "black").unwrap_err();
        assert!(matches!(err, EditorError::InvalidHex { .. }));
        assert_eq!(session.working(), &before);
    }

    #[test]
    fn fitted_session_pads_to_the_display_box() {
        let mut session =
            EditorSession::from_decoded(scenario(), EditorConfig::default()).unwrap();
        assert_eq!(session.working().dimensions(), (500, 500));
        assert_eq!(session.original_size(), (2, 2));
        // square source fills the whole box, so no transparent padding
        let colors = session.palette().len();
        assert_eq!(colors, 3);
        assert_eq!(session.export_buffer().unwrap().dimensions(), (2, 2));
    }

    #[test]
    fn default_palette_ignores_display_padding() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));
        let mut session =
            EditorSession::from_decoded(DynamicImage::ImageRgb8(img), EditorConfig::default())
                .unwrap();
        assert_eq!(session.working().dimensions(), (500, 500));

        let palette = session.palette().to_vec();
        assert_eq!(palette.len(), 3);
        assert!(palette.iter().all(|e| e.percentage == 33.33));
        assert!(palette.iter().all(|e| e.color != Color::Rgba(0, 0, 0, 0)));
        assert_eq!(palette[0].color, Color::Rgba(255, 0, 0, 255));
    }

    #[test]
    fn default_palette_follows_recolors() {
        let mut session =
            EditorSession::from_decoded(scenario(), EditorConfig::default()).unwrap();
        session.apply_recolor("#ff0000", "#0000ff").unwrap();
        let palette = session.palette().to_vec();
        assert_eq!(palette.len(), 2);
        let blue = palette
            .iter()
            .find(|e| e.color == Color::Rgba(0, 0, 255, 255))
            .unwrap();
        assert_eq!((blue.pixel_count, blue.percentage), (3, 75.0));
    }

    #[test]
    fn fitted_rgb_palette_keeps_rgb_entries() {
        let config = EditorConfig {
            fit_to_display: true,
            palette_source: PaletteSource::Working,
            ..EditorConfig::rgb()
        };
        let mut img = RgbImage::from_pixel(4, 1, Rgb([9, 9, 9]));
        img.put_pixel(3, 0, Rgb([1, 2, 3]));
        let mut session =
            EditorSession::from_decoded(DynamicImage::ImageRgb8(img), config).unwrap();
        let colors: Vec<(Color, f64)> = session
            .palette()
            .iter()
            .map(|e| (e.color, e.percentage))
            .collect();
        assert_eq!(
            colors,
            vec![(Color::Rgb(1, 2, 3), 25.0), (Color::Rgb(9, 9, 9), 75.0)]
        );
    }

    #[test]
    fn palette_refresh_is_debounced() {
        let mut session =
            EditorSession::from_decoded(scenario(), EditorConfig::default()).unwrap();
        let ms = Duration::from_millis;
        session.request_palette_size(ms(0), 12);
        session.request_palette_size(ms(200), 20);
        assert!(session.poll(ms(400)).is_none());
        assert!(session.has_pending_refresh());
        let palette = session.poll(ms(500)).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(session.palette_size(), 20);
        assert!(session.poll(ms(900)).is_none());
    }

    #[test]
    fn unsupported_bytes_are_rejected() {
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
        let err = EditorSession::open_bytes(gif, EditorConfig::default()).unwrap_err();
        assert!(matches!(err, EditorError::ImageLoad { .. }));
    }

    #[test]
    fn png_bytes_round_trip_through_open_bytes() {
        let session = EditorSession::from_decoded(scenario(), EditorConfig::default()).unwrap();
        let png = session.encode_png().unwrap();
        let reopened = EditorSession::open_bytes(&png, EditorConfig::rgb()).unwrap();
        assert_eq!(
            reopened.source().to_rgb8().into_raw(),
            scenario().to_rgb8().into_raw()
        );
    }
}
