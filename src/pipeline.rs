//! The editing pipeline: validate → compress → upload → update state.
//!
//! [`MediaEditor`] is one open product edit session. It owns the
//! [`ProductMediaState`] and only mutates it after the network call that
//! produced a URL has succeeded, so a failed upload leaves the lists
//! exactly as they were.
//!
//! Compression runs on tokio's blocking pool so the async caller keeps
//! making progress while images are encoded.
//!
//! Removals are local first. The remote delete is spawned and never
//! awaited on the editing path; without a runtime it is skipped.

use crate::editor::{ProductMediaState, SpecificationList};
use crate::imaging::{CompressOptions, CompressionError, ImageBackend, compress_many};
use crate::media::MediaFile;
use crate::product::{ProductMediaPayload, ProductRecord};
use crate::transport::Transport;
use crate::upload::{Session, UploadClient, UploadError, UploadFolder, progress_percent};
use crate::validation::{Limits, ValidationError, validate_image_file, validate_video_file};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Compression(#[from] CompressionError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Compression worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// A locally removed asset and its background delete, if one was started.
#[derive(Debug)]
pub struct Removed {
    pub url: String,
    pub cleanup: Option<JoinHandle<bool>>,
}

pub struct MediaEditor<T, B> {
    client: UploadClient<T>,
    backend: Arc<B>,
    session: Session,
    compression: CompressOptions,
    limits: Limits,
    state: ProductMediaState,
    specifications: SpecificationList,
}

impl<T: Transport + 'static, B: ImageBackend + Send + 'static> MediaEditor<T, B> {
    /// An editor for a new product with no media.
    pub fn new(client: UploadClient<T>, backend: B, session: Session) -> Self {
        Self {
            client,
            backend: Arc::new(backend),
            session,
            compression: CompressOptions::default(),
            limits: Limits::default(),
            state: ProductMediaState::new(),
            specifications: SpecificationList::new(),
        }
    }

    /// Hydrate from the product as the API returned it.
    pub fn with_product(mut self, record: &ProductRecord) -> Self {
        self.state = record.media_state();
        self.specifications = record.specification_list();
        self
    }

    pub fn with_compression(mut self, options: CompressOptions) -> Self {
        self.compression = options;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn state(&self) -> &ProductMediaState {
        &self.state
    }

    /// Local-only edits (hover toggle, reorder) go straight to the state.
    pub fn state_mut(&mut self) -> &mut ProductMediaState {
        &mut self.state
    }

    pub fn specifications(&self) -> &SpecificationList {
        &self.specifications
    }

    pub fn specifications_mut(&mut self) -> &mut SpecificationList {
        &mut self.specifications
    }

    pub fn client(&self) -> &UploadClient<T> {
        &self.client
    }

    /// Validate, compress and upload a batch of images, then append them.
    ///
    /// Every file is validated before anything is compressed, and every
    /// file is compressed before anything is uploaded. Images are appended
    /// in input order, and only if the whole batch uploaded. When an upload
    /// fails, the files already stored by this batch are deleted again.
    pub async fn add_images(
        &mut self,
        files: &[MediaFile],
        folder: UploadFolder,
        mut on_progress: impl FnMut(u32) + Send,
    ) -> Result<Vec<String>, PipelineError> {
        for file in files {
            validate_image_file(file, &self.limits)?;
        }
        let compressed = self.compress(files.to_vec()).await?;

        let mut urls = Vec::with_capacity(compressed.len());
        for (i, file) in compressed.iter().enumerate() {
            match self.client.upload(&self.session, file, folder).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    self.discard(&urls).await;
                    return Err(e.into());
                }
            }
            on_progress(progress_percent(i + 1, compressed.len()));
        }

        for url in &urls {
            self.state.add_image(url.clone());
        }
        info!(count = urls.len(), %folder, "added images");
        Ok(urls)
    }

    /// Compress on the blocking pool; results keep input order.
    async fn compress(&self, files: Vec<MediaFile>) -> Result<Vec<MediaFile>, PipelineError> {
        let backend = Arc::clone(&self.backend);
        let options = self.compression.clone();
        let compressed =
            tokio::task::spawn_blocking(move || compress_many(&*backend, &files, &options))
                .await??;
        Ok(compressed.into_iter().map(|c| c.file).collect())
    }

    /// Best-effort removal of objects uploaded by a batch that failed.
    async fn discard(&self, urls: &[String]) {
        for url in urls {
            if !self.client.delete(&self.session, url).await {
                warn!(url = %url, "left orphaned upload in storage");
            }
        }
    }

    /// Validate and upload a video as-is, then append it.
    pub async fn add_video(
        &mut self,
        file: &MediaFile,
        folder: UploadFolder,
    ) -> Result<String, PipelineError> {
        validate_video_file(file, &self.limits)?;
        let url = self.client.upload(&self.session, file, folder).await?;
        self.state.add_video(url.clone());
        Ok(url)
    }

    /// Remove an image now and delete it from storage in the background.
    pub fn remove_image(&mut self, index: usize) -> Option<Removed> {
        let url = self.state.remove_image(index)?;
        Some(self.detach_delete(url))
    }

    pub fn remove_video(&mut self, index: usize) -> Option<Removed> {
        let url = self.state.remove_video(index)?;
        Some(self.detach_delete(url))
    }

    fn detach_delete(&self, url: String) -> Removed {
        let cleanup = self.client.delete_detached(self.session.clone(), url.clone());
        Removed { url, cleanup }
    }

    /// The media half of the save request.
    pub fn payload(&self) -> ProductMediaPayload {
        ProductMediaPayload::from_state(&self.state, &self.specifications)
    }
}
