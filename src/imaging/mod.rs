//! Image compression before upload.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, WebP, GIF) |
//! | **Resize** | Lanczos3, width capped at 1920px |
//! | **Encode** | lossy WebP via libwebp, descending quality ladder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and byte math (unit testable)
//! - **Parameters**: Quality and compression options
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The quality-ladder compressor and ordered batch compression

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_target_dimensions, megabytes_to_bytes};
pub use operations::{
    Compressed, CompressionError, Outcome, WEBP_MIME, compress_image, compress_many,
};
pub use params::{
    CompressOptions, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY_STEPS, DEFAULT_TARGET_MB, Quality,
    RELAXED_TARGET_MB,
};
pub use rust_backend::RustBackend;
