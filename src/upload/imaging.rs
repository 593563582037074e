//! Image re-encoding
//!
//! The upload receiver only depends on [`ImageProcessor`]; the default
//! implementation decodes with the `image` crate, applies EXIF orientation,
//! downscales to fit the bounding box and encodes back to the same format.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

use crate::error::ImageError;

/// Image formats that are re-encoded on upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
}

impl ImageKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "webp" => Some(ImageKind::WebP),
            _ => None,
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::WebP => ImageFormat::WebP,
        }
    }
}

/// Re-encodes image bytes so they fit inside `max_width` x `max_height`
pub trait ImageProcessor: Send + Sync {
    fn reencode(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
        format: ImageKind,
    ) -> Result<Vec<u8>, ImageError>;
}

/// [`ImageProcessor`] backed by the `image` crate
#[derive(Debug, Clone)]
pub struct ImageCrateProcessor {
    jpeg_quality: u8,
}

impl ImageCrateProcessor {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }
}

impl Default for ImageCrateProcessor {
    fn default() -> Self {
        Self::new(90)
    }
}

impl ImageProcessor for ImageCrateProcessor {
    fn reencode(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
        format: ImageKind,
    ) -> Result<Vec<u8>, ImageError> {
        let mut decoder = ImageReader::with_format(Cursor::new(bytes), format.format())
            .into_decoder()
            .map_err(decode_error)?;
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        let mut img = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
        img.apply_orientation(orientation);

        let (width, height) = fit_within(img.width(), img.height(), max_width, max_height);
        if (width, height) != (img.width(), img.height()) {
            img = img.resize_exact(width, height, FilterType::Triangle);
        }

        let mut out = Vec::new();
        match format {
            ImageKind::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
                rgb.write_with_encoder(encoder)
                    .map_err(encode_error)?;
            }
            ImageKind::Png => {
                img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
                    .map_err(encode_error)?;
            }
            ImageKind::WebP => {
                // The WebP encoder only takes 8-bit RGB(A)
                let img = if img.color().has_alpha() {
                    DynamicImage::ImageRgba8(img.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(img.to_rgb8())
                };
                img.write_to(&mut Cursor::new(&mut out), ImageFormat::WebP)
                    .map_err(encode_error)?;
            }
        }

        Ok(out)
    }
}

fn decode_error(error: image::ImageError) -> ImageError {
    match error {
        image::ImageError::Unsupported(e) => ImageError::UnsupportedFormat(e.to_string()),
        e => ImageError::DecodeError(e.to_string()),
    }
}

fn encode_error(error: image::ImageError) -> ImageError {
    match error {
        image::ImageError::Unsupported(e) => ImageError::UnsupportedFormat(e.to_string()),
        e => ImageError::EncodeError(e.to_string()),
    }
}

/// Largest size with the same aspect ratio that fits the box. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scaled_width = ((width as f64 * scale).round() as u32).clamp(1, max_width);
    let scaled_height = ((height as f64 * scale).round() as u32).clamp(1, max_height);
    (scaled_width, scaled_height)
}
