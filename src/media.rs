//! Media files and assets.
//!
//! A [`MediaFile`] is what the admin selected: a name, a declared MIME type,
//! and the raw bytes. A [`MediaAsset`] is what ends up on the product: a
//! public URL whose [`MediaKind`] is inferred from its extension. Nothing
//! else (dimensions, duration) is tracked.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// URL suffixes that identify a video asset.
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov", ".avi"];

/// Extension → MIME type for the formats the pipeline knows about.
const MIME_BY_EXTENSION: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
];

const FALLBACK_MIME: &str = "application/octet-stream";

/// Whether an asset renders as an image or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Infer the kind from a URL by case-insensitive suffix match.
    ///
    /// Anything that does not end in a known video extension is an image.
    pub fn from_url(url: &str) -> Self {
        if is_video_url(url) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// True when the URL ends in `.mp4`, `.webm`, `.mov` or `.avi` (any case).
pub fn is_video_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// A stored media item: its public URL plus the inferred kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    pub kind: MediaKind,
}

impl MediaAsset {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = MediaKind::from_url(&url);
        Self { url, kind }
    }
}

/// A file selected for upload, held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Original filename, sent as the multipart filename.
    pub name: String,
    /// Declared MIME type (e.g. `image/jpeg`).
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            mime: mime_for_path(path).to_string(),
            name,
            bytes,
        })
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }
}

/// Guess a MIME type from a path's extension.
///
/// Unknown extensions map to `application/octet-stream`, which the validator
/// rejects as both an image and a video.
pub fn mime_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return FALLBACK_MIME;
    };
    MIME_BY_EXTENSION
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

/// Replace the extension of `name` with `ext` (`"ring.png"`, `"webp"` → `"ring.webp"`).
pub fn with_extension(name: &str, ext: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.{ext}"),
        _ => format!("{name}.{ext}"),
    }
}

/// The first name that appears more than once, if any.
///
/// Compression renames to `.webp`, so `ring.png` and `ring.jpg` land on
/// the same output name.
pub fn first_duplicate_name<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}
