//! Image pipeline - derivative generation for uploaded photos
//!
//! Every stored item carries two JPEG derivatives produced from the original
//! upload: a grid thumbnail and a larger "full" rendition for the detail
//! view. The original bytes are discarded after processing; the full
//! derivative is the archival copy.
//!
//! Scaling never enlarges: an image already within bounds is recompressed at
//! the target quality without resampling.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;

use vestry_common::{Error, Result};

/// Longest edge of the grid thumbnail derivative
pub const THUMB_MAX_DIM: u32 = 520;
/// JPEG quality of the thumbnail derivative
pub const THUMB_JPEG_QUALITY: u8 = 80;
/// Longest edge of the full derivative
pub const FULL_MAX_DIM: u32 = 1400;
/// JPEG quality of the full derivative
pub const FULL_JPEG_QUALITY: u8 = 84;

/// One encoded derivative: JPEG bytes plus pixel dimensions
#[derive(Debug, Clone)]
pub struct Derivative {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Both derivatives produced from one upload
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub full: Derivative,
    pub thumb: Derivative,
}

/// Decode an uploaded photo and produce both derivatives
///
/// Accepts any format the `image` crate decodes (JPEG, PNG, WebP, GIF,
/// BMP, ...). Alpha is dropped during the RGB flatten, matching a draw
/// onto an opaque canvas.
pub fn process_upload(bytes: &[u8]) -> Result<ProcessedImage> {
    let source = decode_rgb(bytes)?;
    let full = encode_derivative(&source, FULL_MAX_DIM, FULL_JPEG_QUALITY)?;
    let thumb = encode_derivative(&source, THUMB_MAX_DIM, THUMB_JPEG_QUALITY)?;
    Ok(ProcessedImage { full, thumb })
}

/// Regenerate a thumbnail from a stored full derivative
///
/// Used by the backfill sweep for records stored before thumbnails existed.
pub fn regenerate_thumbnail(full_jpeg: &[u8]) -> Result<Derivative> {
    let source = decode_rgb(full_jpeg)?;
    encode_derivative(&source, THUMB_MAX_DIM, THUMB_JPEG_QUALITY)
}

fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(Error::Image("empty image payload".to_string()));
    }
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| Error::Image(format!("failed to decode image: {}", e)))?;
    Ok(decoded.to_rgb8())
}

/// Compute target dimensions for a bounding box of `max_dim`
///
/// `scale = min(1, max_dim / longest_edge)`, each edge rounded and floored
/// at 1 pixel. Images already within bounds keep their dimensions.
fn scaled_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dim {
        return (width, height);
    }
    let scale = max_dim as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

fn encode_derivative(source: &RgbImage, max_dim: u32, quality: u8) -> Result<Derivative> {
    let (width, height) = source.dimensions();
    let (target_w, target_h) = scaled_dimensions(width, height, max_dim);

    let resized;
    let pixels = if (target_w, target_h) == (width, height) {
        source
    } else {
        resized = image::imageops::resize(source, target_w, target_h, FilterType::Lanczos3);
        &resized
    };

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    pixels
        .write_with_encoder(encoder)
        .map_err(|e| Error::Image(format!("failed to encode JPEG: {}", e)))?;

    Ok(Derivative {
        jpeg,
        width: target_w,
        height: target_h,
    })
}
