//! CLI output formatting for each command.
//!
//! Every file is listed by its 1-based position in the input and its name,
//! with results as indented context lines:
//!
//! ## Validate
//!
//! ```text
//! 001 ring.jpg (image/jpeg, 3.2 MB)
//!     ok
//! 002 spin.avi (video/x-msvideo, 25.0 MB)
//!     rejected: Video must be less than 20MB. Please compress the video before uploading
//!
//! 1 accepted, 1 rejected
//! ```
//!
//! ## Compress
//!
//! ```text
//! 001 necklace.png → necklace.webp
//!     Size: 8.4 MB → 412.0 KB
//!     Encoded: quality 85, 1920x960
//! 002 band.webp
//!     Skipped: already WebP under target
//! ```
//!
//! ## Upload
//!
//! ```text
//! 001 ring.webp → https://jewelstore.sgp1.digitaloceanspaces.com/products/ring.webp
//!
//! Uploaded 1 file to products
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Diagnostics go
//! to stderr through `tracing`, never through here.

use crate::imaging::{Compressed, CompressionError, Outcome};
use crate::media::MediaFile;
use crate::upload::UploadFolder;
use crate::validation::ValidationError;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count with one decimal (`512 B`, `1.5 KB`, `2.0 MB`).
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Validate
// ============================================================================

pub fn format_validation(results: &[(&MediaFile, Result<(), ValidationError>)]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rejected = 0;

    for (pos, (file, result)) in results.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}, {})",
            format_index(pos + 1),
            file.name,
            file.mime,
            format_bytes(file.size())
        ));
        match result {
            Ok(()) => lines.push("    ok".to_string()),
            Err(e) => {
                rejected += 1;
                lines.push(format!("    rejected: {e}"));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{} accepted, {} rejected",
        results.len() - rejected,
        rejected
    ));
    lines
}

pub fn print_validation(results: &[(&MediaFile, Result<(), ValidationError>)]) {
    print_lines(format_validation(results));
}

// ============================================================================
// Compress
// ============================================================================

pub fn format_compression(
    results: &[(&MediaFile, Result<Compressed, CompressionError>)],
) -> Vec<String> {
    let mut lines = Vec::new();

    for (pos, (source, result)) in results.iter().enumerate() {
        let index = format_index(pos + 1);
        match result {
            Ok(Compressed {
                file,
                outcome: Outcome::Skipped,
            }) => {
                lines.push(format!("{} {}", index, file.name));
                lines.push("    Skipped: already WebP under target".to_string());
            }
            Ok(Compressed {
                file,
                outcome: Outcome::Encoded { quality, dimensions },
            }) => {
                lines.push(format!("{} {} \u{2192} {}", index, source.name, file.name));
                lines.push(format!(
                    "    Size: {} \u{2192} {}",
                    format_bytes(source.size()),
                    format_bytes(file.size())
                ));
                lines.push(format!(
                    "    Encoded: quality {}, {}x{}",
                    quality.value(),
                    dimensions.width,
                    dimensions.height
                ));
            }
            Err(e) => {
                lines.push(format!("{} {}", index, source.name));
                lines.push(format!("    failed: {e}"));
            }
        }
    }
    lines
}

pub fn print_compression(results: &[(&MediaFile, Result<Compressed, CompressionError>)]) {
    print_lines(format_compression(results));
}

// ============================================================================
// Upload / delete
// ============================================================================

/// `uploaded` pairs each sent filename with its public URL, in upload order.
pub fn format_upload(folder: UploadFolder, uploaded: &[(String, String)]) -> Vec<String> {
    let mut lines: Vec<String> = uploaded
        .iter()
        .enumerate()
        .map(|(pos, (name, url))| format!("{} {} \u{2192} {}", format_index(pos + 1), name, url))
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "Uploaded {} to {}",
        plural(uploaded.len(), "file"),
        folder
    ));
    lines
}

pub fn print_upload(folder: UploadFolder, uploaded: &[(String, String)]) {
    print_lines(format_upload(folder, uploaded));
}

pub fn format_delete(url: &str, deleted: bool) -> Vec<String> {
    if deleted {
        vec![format!("Deleted {url}")]
    } else {
        vec![format!("Not deleted: {url}")]
    }
}

pub fn print_delete(url: &str, deleted: bool) {
    print_lines(format_delete(url, deleted));
}
