//! Shared test utilities for the storefront-media test suite.
//!
//! Provides in-memory image fixtures and a recording [`MockTransport`] so
//! upload logic can be exercised without a network.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let transport = MockTransport::new();
//! let client = UploadClient::new(transport, "http://api.test", Storage::default());
//! let url = client.upload(&session(), &png_file("a.png", 64, 64), UploadFolder::Products).await?;
//! assert_eq!(url, bucket_url("products/a.png"));
//! ```

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

use crate::cdn::DEFAULT_BUCKET_URL;
use crate::media::MediaFile;
use crate::transport::{Body, HttpReply, HttpRequest, Transport, TransportError};
use crate::upload::Session;

// =========================================================================
// Image fixtures
// =========================================================================

/// Deterministic noise. Compresses badly, which is the point.
pub fn noisy_rgb(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x9E37_79B9;
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        };
        Rgb([next(), next(), next()])
    })
}

/// Encode a noise image in `format`.
pub fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let rgb = noisy_rgb(width, height);
    let img = match format {
        ImageFormat::Gif => DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(rgb).to_rgba8()),
        _ => DynamicImage::ImageRgb8(rgb),
    };
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A smooth-gradient PNG wrapped as a selected file.
///
/// Gradients encode to small WebPs, so this reliably fits a 2MB target.
pub fn png_file(name: &str, width: u32, height: u32) -> MediaFile {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    MediaFile::new(name, "image/png", buf.into_inner())
}

// =========================================================================
// Sessions and URLs
// =========================================================================

/// A logged-in admin for tenant `gautam`.
pub fn session() -> Session {
    Session::new(Some("secret-token".to_string()), "gautam")
}

/// Public URL for `path` in the default bucket.
pub fn bucket_url(path: &str) -> String {
    format!("{DEFAULT_BUCKET_URL}/{path}")
}

// =========================================================================
// Recording transport
// =========================================================================

/// Transport that records every request and answers from a script.
///
/// With an empty script it behaves like a healthy API: multipart uploads get
/// a `publicUrl` under `{folder}/{filename}` and everything else gets
/// `{"success":true}`.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<HttpRequest>>,
    replies: Mutex<VecDeque<HttpReply>>,
    offline: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next requests with `replies`, in order.
    pub fn with_replies(replies: Vec<HttpReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Every request fails with a network error.
    pub fn failing() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn default_reply(request: &HttpRequest) -> HttpReply {
        match &request.body {
            Body::Multipart { fields, file } => {
                let folder = fields
                    .iter()
                    .find(|(k, _)| k == "folder")
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("misc");
                let key = format!("{folder}/{}", file.filename);
                let body = serde_json::json!({ "publicUrl": bucket_url(&key), "key": key });
                HttpReply::new(200, body.to_string())
            }
            _ => HttpReply::new(200, r#"{"success":true}"#),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        let scripted = self.replies.lock().unwrap().pop_front();
        let reply = scripted.unwrap_or_else(|| Self::default_reply(&request));
        self.requests.lock().unwrap().push(request);
        if self.offline {
            return Err(TransportError::Network("connection refused".to_string()));
        }
        Ok(reply)
    }
}
