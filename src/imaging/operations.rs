//! High-level compression operations.
//!
//! These functions combine calculations with backend execution: decode once,
//! render at the capped width, then walk the quality ladder until an encoding
//! fits the byte target.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_target_dimensions, fits};
use super::params::{CompressOptions, Quality};
use crate::media::{MediaFile, with_extension};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

pub const WEBP_MIME: &str = "image/webp";

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error(
        "Unable to compress image under {target_mb}MB. Please compress the image manually before uploading"
    )]
    TooLarge {
        target_mb: f64,
        /// Size of the last (lowest-quality) attempt.
        smallest: u64,
    },
    #[error("Only images can be compressed (got {0})")]
    NotAnImage(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for compression operations.
pub type Result<T> = std::result::Result<T, CompressionError>;

/// What the compressor did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already WebP and under target; returned untouched.
    Skipped,
    /// Re-encoded at `quality` into `dimensions`.
    Encoded {
        quality: Quality,
        dimensions: Dimensions,
    },
}

/// A compressed (or passed-through) file plus how it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct Compressed {
    pub file: MediaFile,
    pub outcome: Outcome,
}

/// Compress an image to WebP under `options.target_mb`.
///
/// A WebP already at or under the target is returned unchanged, which
/// makes the operation idempotent on its own output. Otherwise the image is
/// decoded, rendered with width ≤ `options.max_width`, and encoded at each
/// quality in `options.quality_steps` until one fits. If none fits the
/// operation fails; an oversized file is never returned.
pub fn compress_image(
    backend: &impl ImageBackend,
    file: &MediaFile,
    options: &CompressOptions,
) -> Result<Compressed> {
    if !file.mime.starts_with("image/") {
        return Err(CompressionError::NotAnImage(file.mime.clone()));
    }

    let target = options.target_bytes();
    if file.mime == WEBP_MIME && fits(file.size(), target) {
        debug!(name = %file.name, size = file.size(), "already WebP under target, skipping");
        return Ok(Compressed {
            file: file.clone(),
            outcome: Outcome::Skipped,
        });
    }

    let decoded = backend.decode(&file.bytes)?;
    let source = backend.dimensions(&decoded);
    let (width, height) =
        calculate_target_dimensions((source.width, source.height), options.max_width);
    let surface = backend.render(&decoded, width, height)?;

    let mut smallest = u64::MAX;
    for &quality in &options.quality_steps {
        let encoded = backend.encode_webp(&surface, quality)?;
        let size = encoded.len() as u64;
        debug!(name = %file.name, quality = quality.value(), size, target, "compression attempt");
        if fits(size, target) {
            info!(
                name = %file.name,
                original = file.size(),
                compressed = size,
                quality = quality.value(),
                "compressed image"
            );
            return Ok(Compressed {
                file: MediaFile::new(with_extension(&file.name, "webp"), WEBP_MIME, encoded),
                outcome: Outcome::Encoded {
                    quality,
                    dimensions: Dimensions { width, height },
                },
            });
        }
        smallest = size;
    }

    Err(CompressionError::TooLarge {
        target_mb: options.target_mb,
        smallest,
    })
}

/// Compress a batch on the rayon pool.
///
/// Results come back in input order regardless of which file finished
/// first. The first failure (in input order) fails the batch.
pub fn compress_many(
    backend: &impl ImageBackend,
    files: &[MediaFile],
    options: &CompressOptions,
) -> Result<Vec<Compressed>> {
    files
        .par_iter()
        .map(|file| compress_image(backend, file, options))
        .collect()
}
