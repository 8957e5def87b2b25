//! Reqwest-backed generation backend.
//!
//! This adapter owns transport details only: URL construction, the key
//! header, status mapping and JSON decoding. It turns every failure into a
//! [`CallFailure`] whose message keeps the status code and backend status
//! text, so the retry classifier can match on them.

use super::GenerationBackend;
use super::dto::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use crate::retry::CallFailure;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Backend that POSTs to `{endpoint}/v1beta/models/{model}:generateContent`.
pub struct HttpGenerationBackend {
    client: Client,
    endpoint: Url,
}

impl HttpGenerationBackend {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    fn model_url(&self, model: &str) -> Result<Url, CallFailure> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/v1beta/models/{model}:generateContent"))
            .map_err(|e| CallFailure::new(format!("invalid backend URL for model {model}: {e}")))
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CallFailure> {
        let url = self.model_url(model)?;
        debug!(%url, "calling generation backend");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        serde_json::from_slice(body.as_ref())
            .map_err(|e| CallFailure::new(format!("invalid generateContent response: {e}")))
    }
}

fn map_transport_error(error: reqwest::Error) -> CallFailure {
    match error.status() {
        Some(status) => CallFailure::with_status(status.as_u16(), error.to_string()),
        None => CallFailure::new(error.to_string()),
    }
}

/// `"<code> <STATUS>: <message>"`, falling back to a body preview when the
/// error envelope cannot be decoded.
fn map_status_error(status: StatusCode, body: &[u8]) -> CallFailure {
    let detail = match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{}: {}", envelope.error.status, envelope.error.message),
        Err(_) => body_preview(body),
    };
    let message = if detail.is_empty() {
        format!("{}", status.as_u16())
    } else {
        format!("{} {}", status.as_u16(), detail)
    };
    CallFailure::with_status(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
