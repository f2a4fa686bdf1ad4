//! Storage bucket URLs and CDN rewriting.
//!
//! Product media lives in a single object-storage bucket laid out by folder:
//!
//! ```text
//! products/{product-slug}/{image}
//! categories/{category-slug}/{image}
//! banners/{banner}
//! about/{image}
//! logos/{logo}
//! ```
//!
//! A URL is "ours" when it contains the storage host pattern. Only those URLs
//! are rewritten for the CDN edge or deleted remotely; everything else is
//! opaque and passed through untouched.

use crate::media::is_video_url;

pub const DEFAULT_BUCKET_URL: &str = "https://jewelstore.sgp1.digitaloceanspaces.com";
pub const DEFAULT_HOST_PATTERN: &str = "digitaloceanspaces.com";
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-jewelry.jpg";

/// Query-parameter request for a resized/re-encoded variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnOptions {
    pub width: Option<u32>,
    pub quality: u32,
    pub format: String,
}

impl CdnOptions {
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }
}

impl Default for CdnOptions {
    fn default() -> Self {
        Self {
            width: None,
            quality: 85,
            format: "webp".to_string(),
        }
    }
}

/// The external object store: where public URLs point and how to recognize them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage {
    /// Public base URL of the bucket, no trailing slash required.
    pub bucket_url: String,
    /// Substring identifying storage-hosted URLs.
    pub host_pattern: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            bucket_url: DEFAULT_BUCKET_URL.to_string(),
            host_pattern: DEFAULT_HOST_PATTERN.to_string(),
        }
    }
}

impl Storage {
    pub fn new(bucket_url: impl Into<String>, host_pattern: impl Into<String>) -> Self {
        Self {
            bucket_url: bucket_url.into(),
            host_pattern: host_pattern.into(),
        }
    }

    /// True when `url` points into the bucket.
    pub fn is_storage_url(&self, url: &str) -> bool {
        !self.host_pattern.is_empty() && url.contains(&self.host_pattern)
    }

    /// Append CDN resize/quality/format parameters to a bucket image URL.
    ///
    /// Empty URLs, non-bucket URLs, and video URLs come back byte-for-byte
    /// unchanged. Not idempotent: applying twice duplicates the parameters.
    pub fn cdn_optimized_url(&self, url: &str, options: &CdnOptions) -> String {
        if url.is_empty() || !self.is_storage_url(url) || is_video_url(url) {
            return url.to_string();
        }

        let mut params = Vec::with_capacity(3);
        if let Some(width) = options.width {
            params.push(format!("width={width}"));
        }
        params.push(format!("quality={}", options.quality));
        params.push(format!("format={}", options.format));

        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{}", params.join("&"))
    }

    /// Full URL for a path inside the bucket. A leading `/` is ignored.
    pub fn storage_url(&self, path: &str) -> String {
        let clean = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.bucket_url.trim_end_matches('/'), clean)
    }

    pub fn product_image_url(&self, product_slug: &str, image_name: &str) -> String {
        self.storage_url(&format!("products/{product_slug}/{image_name}"))
    }

    /// Category cover; pass `None` for the conventional `cover.jpg`.
    pub fn category_image_url(&self, category_slug: &str, image_name: Option<&str>) -> String {
        let name = image_name.unwrap_or("cover.jpg");
        self.storage_url(&format!("categories/{category_slug}/{name}"))
    }

    pub fn banner_image_url(&self, banner_name: &str) -> String {
        self.storage_url(&format!("banners/{banner_name}"))
    }

    pub fn about_image_url(&self, image_name: &str) -> String {
        self.storage_url(&format!("about/{image_name}"))
    }

    /// Resolve a stored value for display.
    ///
    /// Empty → `fallback` (or the placeholder), absolute URL → as-is,
    /// anything else → a path inside the bucket.
    pub fn resolve_image_url(&self, url: &str, fallback: Option<&str>) -> String {
        if url.is_empty() {
            return fallback.unwrap_or(PLACEHOLDER_IMAGE).to_string();
        }
        if is_full_url(url) {
            return url.to_string();
        }
        self.storage_url(url)
    }
}

pub fn is_full_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
