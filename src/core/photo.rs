//! Photo preparation before upload: rotate, bound, re-encode as JPEG, base64.

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{AushadhError, Result};
use base64::engine::general_purpose;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use std::io::Cursor;

pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub max_dimension: u32,
    pub quality: u8,
    /// Clockwise quarter turns in degrees.
    pub rotation: u16,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_dimension: crate::config::DEFAULT_MAX_DIMENSION,
            quality: crate::config::DEFAULT_JPEG_QUALITY,
            rotation: 0,
        }
    }
}

impl ImageOptions {
    pub fn from_config(config: &impl ConfigProvider, rotation: u16) -> Self {
        Self {
            max_dimension: config.max_dimension(),
            quality: config.jpeg_quality(),
            rotation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Standard base64 without a data-URI prefix.
    pub base64: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

pub fn prepare_image(bytes: &[u8], options: &ImageOptions) -> Result<PreparedImage> {
    let img = decode_upright(bytes)?;
    let (source_w, source_h) = img.dimensions();

    let img = rotate(img, options.rotation)?;
    let img = resize_if_needed(img, options.max_dimension);
    let (width, height) = img.dimensions();

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, options.quality.clamp(1, 100));
    DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;

    tracing::debug!(
        "Prepared image {}x{} -> {}x{} ({} JPEG bytes)",
        source_w,
        source_h,
        width,
        height,
        jpeg.len()
    );

    Ok(PreparedImage {
        base64: general_purpose::STANDARD.encode(&jpeg),
        mime_type: JPEG_MIME,
        width,
        height,
    })
}

/// Decodes and applies the EXIF orientation, so phone photos come out the way
/// they were shot. The manual `rotation` is applied on top of this.
fn decode_upright(bytes: &[u8]) -> Result<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder)?;

    if orientation != Orientation::NoTransforms {
        tracing::debug!("Applying EXIF orientation {:?}", orientation);
        img.apply_orientation(orientation);
    }
    Ok(img)
}

fn rotate(img: DynamicImage, degrees: u16) -> Result<DynamicImage> {
    match degrees % 360 {
        0 => Ok(img),
        90 => Ok(img.rotate90()),
        180 => Ok(img.rotate180()),
        270 => Ok(img.rotate270()),
        other => Err(AushadhError::ValidationError {
            message: format!("Rotation must be a multiple of 90 degrees, got {}", other),
        }),
    }
}

fn resize_if_needed(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (new_width, new_height) = scaled_dimensions(width, height, max_dimension);

    if (new_width, new_height) == (width, height) {
        return img;
    }

    img.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Bounds the longer side to `max_dimension`, keeping the aspect ratio.
/// Images already within bounds are returned unchanged; never upscales.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let (w, h) = (width as f64, height as f64);
    if width > height {
        let scaled = (h * max_dimension as f64 / w).round() as u32;
        (max_dimension, scaled.clamp(1, max_dimension))
    } else {
        let scaled = (w * max_dimension as f64 / h).round() as u32;
        (scaled.clamp(1, max_dimension), max_dimension)
    }
}

/// Payload after the first comma of a data URI; plain base64 passes through.
pub fn strip_data_uri(input: &str) -> &str {
    match input.split_once(',') {
        Some((_, payload)) if !payload.is_empty() => payload,
        _ => input,
    }
}

/// MIME type of a `data:<mime>;base64,...` URI.
pub fn data_uri_mime(input: &str) -> Option<&str> {
    let header = input.strip_prefix("data:")?.split_once(',')?.0;
    let mime = header.split(';').next()?.trim();
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}
