//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the normalizer
//! needs: identify (read dimensions without a full decode) and normalize
//! (decode, resize, flatten, re-encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests swap in the
//! recording mock below so normalization planning can be checked without
//! touching pixels.

use super::params::NormalizeParams;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{0}")]
    Decode(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Implementations are called from a blocking worker thread, hence
/// `Send + Sync`.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions from encoded bytes.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, resize to the exact target, flatten onto the backdrop and
    /// re-encode. Returns the encoded bytes.
    fn normalize(&self, params: &NormalizeParams<'_>) -> Result<Vec<u8>, BackendError>;
}
