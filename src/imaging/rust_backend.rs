//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format sniffing | `image::ImageReader::with_guessed_format` |
//! | Decode (JPEG, PNG, WebP, GIF, BMP) | `image` crate decoders |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Flatten alpha | per-pixel blend onto the backdrop colour |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{NormalizeParams, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use std::io::Cursor;

/// MIME type of everything this backend encodes.
pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(format!("Failed to read image header: {e}")))
}

/// Decode encoded bytes, rejecting zero-sized images.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    let img = reader(source)?
        .decode()
        .map_err(|e| BackendError::Decode(format!("Failed to decode image: {e}")))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(BackendError::Decode("Image has zero width or height".into()));
    }
    Ok(img)
}

/// Composite every pixel onto an opaque backdrop.
fn flatten(img: &DynamicImage, backdrop: [u8; 3]) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend =
            |fg: u8, bg: u8| ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8;
        Rgb([
            blend(r, backdrop[0]),
            blend(g, backdrop[1]),
            blend(b, backdrop[2]),
        ])
    })
}

fn encode_jpeg(img: &RgbImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.value() as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(source)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        if width == 0 || height == 0 {
            return Err(BackendError::Decode("Image has zero width or height".into()));
        }
        Ok(Dimensions { width, height })
    }

    fn normalize(&self, params: &NormalizeParams<'_>) -> Result<Vec<u8>, BackendError> {
        let img = load_image(params.source)?;
        let resized = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        let flat = flatten(&resized, params.backdrop);
        encode_jpeg(&flat, params.quality)
    }
}
