//! High-level image operations.
//!
//! These functions combine calculations with backend execution. The
//! synchronous [`normalize`] does the planning and pixel work; the
//! [`ImageNormalizer`] wraps it as an async operation that runs the decoder
//! on the blocking pool so the scheduler thread is never stalled.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::{NormalizeParams, Quality, WHITE_BACKDROP};
use super::rust_backend::{OUTPUT_MIME_TYPE, RustBackend};
use crate::error::PipelineError;
use crate::payload::ImagePayload;
use std::sync::Arc;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Plan a normalize operation without executing it.
pub fn plan_normalize<'a>(
    source: &'a [u8],
    original_dims: (u32, u32),
    max_edge: u32,
    quality: Quality,
) -> NormalizeParams<'a> {
    let (width, height) = fit_within(original_dims, max_edge);
    NormalizeParams {
        source,
        width,
        height,
        quality,
        backdrop: WHITE_BACKDROP,
    }
}

/// Normalize a payload so its longer edge fits within `max_edge`.
///
/// Always produces a new JPEG payload, even when no resize is needed, so
/// transparency is flattened and the format is uniform.
pub fn normalize(
    backend: &dyn ImageBackend,
    payload: &ImagePayload,
    max_edge: u32,
    quality: Quality,
) -> Result<ImagePayload> {
    let dims = backend.identify(payload.data())?;
    let params = plan_normalize(payload.data(), (dims.width, dims.height), max_edge, quality);
    debug!(
        from_width = dims.width,
        from_height = dims.height,
        to_width = params.width,
        to_height = params.height,
        "normalizing image"
    );
    let encoded = backend.normalize(&params)?;
    Ok(ImagePayload::new(OUTPUT_MIME_TYPE, encoded))
}

/// Async facade over [`normalize`] shared by the generation client.
#[derive(Clone)]
pub struct ImageNormalizer {
    backend: Arc<dyn ImageBackend>,
    quality: Quality,
}

impl ImageNormalizer {
    pub fn new(backend: Arc<dyn ImageBackend>, quality: Quality) -> Self {
        Self { backend, quality }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Decode and re-encode on the blocking pool.
    pub async fn normalize(
        &self,
        payload: &ImagePayload,
        max_edge: u32,
    ) -> std::result::Result<ImagePayload, PipelineError> {
        let backend = Arc::clone(&self.backend);
        let payload = payload.clone();
        let quality = self.quality;
        tokio::task::spawn_blocking(move || normalize(backend.as_ref(), &payload, max_edge, quality))
            .await
            .map_err(|e| PipelineError::Decode(format!("Image worker failed: {e}")))?
            .map_err(PipelineError::from)
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(RustBackend::new()), Quality::default())
    }
}
