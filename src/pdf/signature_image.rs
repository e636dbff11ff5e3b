use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

use super::canvas::RasterImage;

#[derive(Debug)]
pub enum SignatureImageError {
    Empty,
    Base64(base64::DecodeError),
    Image(image::ImageError),
}

impl fmt::Display for SignatureImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureImageError::Empty => write!(f, "empty signature image"),
            SignatureImageError::Base64(e) => write!(f, "invalid base64: {e}"),
            SignatureImageError::Image(e) => write!(f, "unreadable image: {e}"),
        }
    }
}

impl std::error::Error for SignatureImageError {}

impl From<base64::DecodeError> for SignatureImageError {
    fn from(e: base64::DecodeError) -> Self {
        SignatureImageError::Base64(e)
    }
}

impl From<image::ImageError> for SignatureImageError {
    fn from(e: image::ImageError) -> Self {
        SignatureImageError::Image(e)
    }
}

/// Decode a signature pad capture (`data:image/png;base64,...` or bare base64).
/// Transparent pixels are flattened onto white.
pub fn decode_signature(data: &str) -> Result<RasterImage, SignatureImageError> {
    let payload = match data.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => data,
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if payload.is_empty() {
        return Err(SignatureImageError::Empty);
    }
    let bytes = STANDARD.decode(payload.as_bytes())?;
    decode_raster(&bytes)
}

/// Decode PNG/JPEG bytes into RGB over a white background.
pub fn decode_raster(bytes: &[u8]) -> Result<RasterImage, SignatureImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        for c in [r, g, b] {
            rgb.push(((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
    }
    Ok(RasterImage { width, height, rgb })
}

/// Largest `(w, h)` with the image's aspect ratio inside `max_w` x `max_h`.
pub fn fit_within(image: &RasterImage, max_w: f32, max_h: f32) -> (f32, f32) {
    if image.width == 0 || image.height == 0 {
        return (0.0, 0.0);
    }
    let ratio = image.width as f32 / image.height as f32;
    if max_w / max_h > ratio {
        (max_h * ratio, max_h)
    } else {
        (max_w, max_w / ratio)
    }
}
