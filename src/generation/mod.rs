//! Generation client: size estimation and try-on compositing.
//!
//! - [`dto`]: `generateContent` request/response wire types
//! - [`HttpGenerationBackend`]: reqwest transport
//! - [`GenerationClient`]: the two pipeline operations, each run through the
//!   retry invoker with payloads prepared by the image normalizer

mod client;
pub mod dto;
mod http_backend;

pub use client::{GenerationClient, GenerationSettings, compose_prompt, size_prompt};
pub use http_backend::HttpGenerationBackend;

use crate::retry::CallFailure;
use async_trait::async_trait;
use dto::{GenerateContentRequest, GenerateContentResponse};

/// One `generateContent` round trip.
///
/// The key is passed on every call rather than held by the backend, so the
/// client can read it fresh each time.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CallFailure>;
}
