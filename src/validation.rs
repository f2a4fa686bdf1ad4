//! Pre-flight checks on selected files.
//!
//! Runs before any compression or network work. Images may be large because
//! they are compressed afterwards; videos are uploaded as-is, so their limit
//! is much tighter.

use crate::media::MediaFile;
use thiserror::Error;

const MB: u64 = 1024 * 1024;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

pub const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "video/x-msvideo",
    "video/avi",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only JPEG, PNG, WebP, and GIF images are allowed")]
    UnsupportedImageType(String),
    #[error(
        "Image must be less than {limit_mb}MB (images are automatically compressed before upload)"
    )]
    ImageTooLarge { size: u64, limit_mb: u64 },
    #[error("Only MP4, WebM, MOV, and AVI videos are allowed")]
    UnsupportedVideoType(String),
    #[error("Video must be less than {limit_mb}MB. Please compress the video before uploading")]
    VideoTooLarge { size: u64, limit_mb: u64 },
}

/// Size ceilings, in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub image_max_mb: u64,
    pub video_max_mb: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            image_max_mb: 100,
            video_max_mb: 20,
        }
    }
}

/// Accept JPEG/PNG/WebP/GIF up to the image limit.
pub fn validate_image_file(file: &MediaFile, limits: &Limits) -> Result<(), ValidationError> {
    if !IMAGE_TYPES.contains(&file.mime.as_str()) {
        return Err(ValidationError::UnsupportedImageType(file.mime.clone()));
    }
    if file.size() > limits.image_max_mb.saturating_mul(MB) {
        return Err(ValidationError::ImageTooLarge {
            size: file.size(),
            limit_mb: limits.image_max_mb,
        });
    }
    Ok(())
}

/// Accept MP4/WebM/MOV/AVI up to the video limit.
pub fn validate_video_file(file: &MediaFile, limits: &Limits) -> Result<(), ValidationError> {
    if !VIDEO_TYPES.contains(&file.mime.as_str()) {
        return Err(ValidationError::UnsupportedVideoType(file.mime.clone()));
    }
    if file.size() > limits.video_max_mb.saturating_mul(MB) {
        return Err(ValidationError::VideoTooLarge {
            size: file.size(),
            limit_mb: limits.video_max_mb,
        });
    }
    Ok(())
}

/// Dispatch on the declared MIME type: `video/*` goes through the video
/// rules, everything else through the image rules.
pub fn validate_file(file: &MediaFile, limits: &Limits) -> Result<(), ValidationError> {
    if file.is_video() {
        validate_video_file(file, limits)
    } else {
        validate_image_file(file, limits)
    }
}
