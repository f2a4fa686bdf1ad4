//! Parameter types for compression.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! [`operations`](super::operations), which walks the quality ladder, and the
//! [`backend`](super::backend), which does the pixel work. Swapping in a mock
//! backend leaves the ladder logic untouched.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100). Clamped on construction.
//! - [`CompressOptions`]: width cap, byte target, and the descending quality ladder.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Encoder-facing value on the 0.0–100.0 scale libwebp expects.
    pub fn as_f32(self) -> f32 {
        self.0 as f32
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Quality levels tried in order until one fits: 0.90 down to 0.60 in 0.05 steps.
pub const DEFAULT_QUALITY_STEPS: &[u32] = &[90, 85, 80, 75, 70, 65, 60];

pub const DEFAULT_MAX_WIDTH: u32 = 1920;

/// Standard target for product imagery.
pub const DEFAULT_TARGET_MB: f64 = 2.0;

/// Relaxed target for large hero/banner artwork.
pub const RELAXED_TARGET_MB: f64 = 20.0;

/// Everything the compressor needs to know about one run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressOptions {
    /// Output width ceiling; height follows the source aspect ratio.
    pub max_width: u32,
    /// Accept the first encoding at or below this size.
    pub target_mb: f64,
    /// Tried in order; expected to be descending.
    pub quality_steps: Vec<Quality>,
}

impl CompressOptions {
    /// Default options with a different byte target.
    pub fn with_target_mb(target_mb: f64) -> Self {
        Self {
            target_mb,
            ..Self::default()
        }
    }

    pub fn target_bytes(&self) -> u64 {
        super::calculations::megabytes_to_bytes(self.target_mb)
    }
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            target_mb: DEFAULT_TARGET_MB,
            quality_steps: DEFAULT_QUALITY_STEPS.iter().copied().map(Quality::new).collect(),
        }
    }
}
