//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the compressor
//! needs: decode bytes into a surface, render that surface at new
//! dimensions, and encode it as lossy WebP at a given quality.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use
//! `MockBackend`, which records calls and returns scripted encoded sizes so
//! the quality ladder can be exercised without real pixels.

use super::params::Quality;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of a decoded or rendered surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Surface` is the backend's in-memory raster. The compressor decodes
/// once, renders once, then encodes the same surface at each quality level.
pub trait ImageBackend: Sync {
    type Surface;

    /// Decode an encoded image (JPEG, PNG, WebP, GIF) into a surface.
    fn decode(&self, data: &[u8]) -> Result<Self::Surface, BackendError>;

    /// Dimensions of a surface.
    fn dimensions(&self, surface: &Self::Surface) -> Dimensions;

    /// Draw `surface` onto a new surface of exactly `width` × `height`.
    fn render(
        &self,
        surface: &Self::Surface,
        width: u32,
        height: u32,
    ) -> Result<Self::Surface, BackendError>;

    /// Encode a surface as lossy WebP.
    fn encode_webp(&self, surface: &Self::Surface, quality: Quality)
    -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock backend that records operations without touching pixels.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// Surfaces are plain [`Dimensions`]. Encoded output is a zero-filled
    /// buffer whose length comes from `encoded_sizes` (keyed by quality),
    /// falling back to `default_size`. `decode_delay` stands in for slow
    /// CPU-bound work.
    #[derive(Default)]
    pub struct MockBackend {
        pub source: Mutex<Option<Dimensions>>,
        pub encoded_sizes: Mutex<HashMap<u32, usize>>,
        pub default_size: usize,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub decode_delay: Duration,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode { bytes: usize },
        Render { width: u32, height: u32 },
        Encode { quality: u32 },
    }

    impl MockBackend {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                source: Mutex::new(Some(Dimensions { width, height })),
                default_size: 1024,
                ..Self::default()
            }
        }

        /// Script encoded sizes per quality level.
        pub fn with_sizes(width: u32, height: u32, sizes: &[(u32, usize)]) -> Self {
            let backend = Self::new(width, height);
            backend
                .encoded_sizes
                .lock()
                .unwrap()
                .extend(sizes.iter().copied());
            backend
        }

        /// A backend whose decode always fails.
        pub fn undecodable() -> Self {
            Self::default()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encode_qualities(&self) -> Vec<u32> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { quality } => Some(quality),
                    _ => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        type Surface = Dimensions;

        fn decode(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode { bytes: data.len() });
            if !self.decode_delay.is_zero() {
                std::thread::sleep(self.decode_delay);
            }
            self.source
                .lock()
                .unwrap()
                .ok_or_else(|| BackendError::Decode("No mock dimensions".to_string()))
        }

        fn dimensions(&self, surface: &Dimensions) -> Dimensions {
            *surface
        }

        fn render(
            &self,
            _surface: &Dimensions,
            width: u32,
            height: u32,
        ) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Render { width, height });
            Ok(Dimensions { width, height })
        }

        fn encode_webp(
            &self,
            _surface: &Dimensions,
            quality: Quality,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                quality: quality.value(),
            });
            let size = self
                .encoded_sizes
                .lock()
                .unwrap()
                .get(&quality.value())
                .copied()
                .unwrap_or(self.default_size);
            Ok(vec![0; size])
        }
    }

    #[test]
    fn mock_records_decode_and_render() {
        let backend = MockBackend::new(800, 600);

        let surface = backend.decode(&[1, 2, 3]).unwrap();
        assert_eq!(backend.dimensions(&surface).width, 800);
        backend.render(&surface, 400, 300).unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode { bytes: 3 },
                RecordedOp::Render {
                    width: 400,
                    height: 300
                },
            ]
        );
    }

    #[test]
    fn mock_returns_scripted_sizes() {
        let backend = MockBackend::with_sizes(10, 10, &[(90, 5000), (85, 3000)]);
        let surface = backend.decode(&[]).unwrap();

        assert_eq!(backend.encode_webp(&surface, Quality::new(90)).unwrap().len(), 5000);
        assert_eq!(backend.encode_webp(&surface, Quality::new(85)).unwrap().len(), 3000);
        assert_eq!(backend.encode_webp(&surface, Quality::new(80)).unwrap().len(), 1024);
        assert_eq!(backend.encode_qualities(), vec![90, 85, 80]);
    }

    #[test]
    fn mock_undecodable_errors() {
        let backend = MockBackend::undecodable();
        assert!(matches!(backend.decode(&[0]), Err(BackendError::Decode(_))));
    }
}
