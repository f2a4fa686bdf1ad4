//! # Storefront Media
//!
//! The media pipeline behind the jewelry storefront's admin console: what
//! happens between an admin picking a file and a product showing it.
//!
//! # Architecture: One File, Four Steps
//!
//! ```text
//! 1. Validate   MediaFile  →  accepted / rejected   (type + size allow-list)
//! 2. Compress   image      →  WebP ≤ target         (width ≤ 1920, quality ladder)
//! 3. Upload     MediaFile  →  public URL            (multipart POST, bearer + tenant)
//! 4. Edit       URL        →  ProductMediaState     (images, videos, hover index)
//! ```
//!
//! At render time, bucket URLs are rewritten with CDN query parameters.
//! Videos skip step 2 and are uploaded as-is.
//!
//! Each step is usable on its own. [`pipeline::MediaEditor`] wires them
//! together the way the product edit form does.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`media`] | `MediaFile`, `MediaAsset`, kind inference from URL suffix, MIME from extension |
//! | [`validation`] | Type and size allow-list for images and videos |
//! | [`imaging`] | Decode, resize, lossy WebP encode under a byte target |
//! | [`transport`] | HTTP request/reply values and the `Transport` trait (reqwest-backed) |
//! | [`upload`] | Upload client: proxied or presigned upload, batch upload, advisory delete |
//! | [`cdn`] | Bucket URL helpers and the CDN query-parameter rewriter |
//! | [`editor`] | `ProductMediaState` and `SpecificationList` edit-session state |
//! | [`product`] | Product response hydration and the media save payload |
//! | [`pipeline`] | `MediaEditor`: validate → compress → upload → update state |
//! | [`config`] | `config.toml` loading, validation, merging, stock config text |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## State Changes Only After Success
//!
//! The edit state is only touched once a URL exists. A rejected file, a
//! compression that cannot reach the target, or a failed upload leaves the
//! image and video lists exactly as they were, so the admin can retry
//! without cleaning anything up.
//!
//! ## Sequential Uploads, Parallel Compression
//!
//! Uploads within a batch go one at a time so progress callbacks and list
//! order match the input order. Compression is CPU-bound: the editor hands
//! it to tokio's blocking pool, which fans out on rayon, and results are
//! collected in input order before anything is uploaded. If an upload fails
//! partway, the files this batch already stored are deleted again.
//!
//! ## Deletes Never Block
//!
//! Removing an image from a product is local and immediate. The storage
//! delete runs on a spawned task and its failure is only logged. Outside a
//! tokio runtime the delete is skipped with a warning; the local removal
//! still happens.
//!
//! ## Explicit Session
//!
//! The bearer token and tenant travel in a [`upload::Session`] passed to
//! every call. There is no ambient client state; an empty session fails
//! before any request is built.

pub mod cdn;
pub mod config;
pub mod editor;
pub mod imaging;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod product;
pub mod transport;
pub mod upload;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;
