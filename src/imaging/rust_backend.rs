//! Production backend built on the `image` crate and libwebp.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF) | `image::ImageReader` with format sniffing |
//! | Render | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → lossy WebP | `webp::Encoder` (libwebp) |
//!
//! The `image` crate's own WebP encoder is lossless-only, so it cannot walk
//! a quality ladder. GIFs decode to their first frame.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::Quality;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Pure Rust decoding plus libwebp encoding.
///
/// See the [module docs](self) for the crate-to-operation mapping.
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

impl ImageBackend for RustBackend {
    type Surface = DynamicImage;

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, BackendError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn dimensions(&self, surface: &DynamicImage) -> Dimensions {
        Dimensions {
            width: surface.width(),
            height: surface.height(),
        }
    }

    fn render(
        &self,
        surface: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Invalid target dimensions {width}x{height}"
            )));
        }
        // RGBA keeps transparency from PNG/GIF sources through to WebP.
        let rgba = DynamicImage::ImageRgba8(surface.to_rgba8());
        if rgba.width() == width && rgba.height() == height {
            return Ok(rgba);
        }
        Ok(rgba.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn encode_webp(
        &self,
        surface: &DynamicImage,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let rgba = surface.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
        let encoded = encoder
            .encode_simple(false, quality.as_f32())
            .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e:?}")))?;
        Ok(encoded.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_test_image, noisy_rgb};
    use image::ImageFormat;

    #[test]
    fn decode_png_reports_dimensions() {
        let png = encode_test_image(200, 150, ImageFormat::Png);
        let backend = RustBackend::new();
        let surface = backend.decode(&png).unwrap();
        assert_eq!(
            backend.dimensions(&surface),
            Dimensions {
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn decode_jpeg_and_gif() {
        let backend = RustBackend::new();
        for format in [ImageFormat::Jpeg, ImageFormat::Gif] {
            let bytes = encode_test_image(64, 48, format);
            let surface = backend.decode(&bytes).unwrap();
            assert_eq!(surface.width(), 64);
            assert_eq!(surface.height(), 48);
        }
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        let result = backend.decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn render_exact_dimensions() {
        let backend = RustBackend::new();
        let surface = DynamicImage::ImageRgb8(noisy_rgb(400, 300));
        let rendered = backend.render(&surface, 200, 150).unwrap();
        assert_eq!(rendered.width(), 200);
        assert_eq!(rendered.height(), 150);
    }

    #[test]
    fn render_zero_dimension_errors() {
        let backend = RustBackend::new();
        let surface = DynamicImage::ImageRgb8(noisy_rgb(10, 10));
        assert!(backend.render(&surface, 0, 10).is_err());
    }

    #[test]
    fn encode_webp_produces_webp_container() {
        let backend = RustBackend::new();
        let surface = DynamicImage::ImageRgb8(noisy_rgb(64, 64));
        let bytes = backend.encode_webp(&surface, Quality::new(80)).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn lower_quality_is_not_larger() {
        let backend = RustBackend::new();
        let surface = DynamicImage::ImageRgb8(noisy_rgb(128, 128));
        let high = backend.encode_webp(&surface, Quality::new(90)).unwrap();
        let low = backend.encode_webp(&surface, Quality::new(60)).unwrap();
        assert!(low.len() <= high.len());
    }
}
