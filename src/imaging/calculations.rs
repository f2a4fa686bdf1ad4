//! Pure calculation functions for compression.
//!
//! All functions here are pure and testable without any I/O or images.

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Calculate output dimensions with the width capped at `max_width`.
///
/// Height is scaled by the same factor and rounded. Images already narrow
/// enough keep their dimensions. Neither edge drops below 1px.
///
/// # Examples
/// ```
/// # use storefront_media::imaging::calculate_target_dimensions;
/// assert_eq!(calculate_target_dimensions((3840, 2160), 1920), (1920, 1080));
/// assert_eq!(calculate_target_dimensions((800, 600), 1920), (800, 600));
/// ```
pub fn calculate_target_dimensions(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= max_width {
        return (src_w, src_h);
    }
    let ratio = max_width as f64 / src_w as f64;
    let h = (src_h as f64 * ratio).round() as u32;
    (max_width.max(1), h.max(1))
}

/// Convert a megabyte target into bytes (1 MB = 1024 × 1024 bytes).
pub fn megabytes_to_bytes(mb: f64) -> u64 {
    (mb * BYTES_PER_MB).floor() as u64
}

/// True when an encoding of `size` bytes satisfies a target of `target_bytes`.
pub fn fits(size: u64, target_bytes: u64) -> bool {
    size <= target_bytes
}
