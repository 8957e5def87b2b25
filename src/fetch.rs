//! Resolve a product's reference image into an [`ImagePayload`].
//!
//! Remote images go through an image resize proxy
//! (`{proxy}?url=<source>&w=<width>&output=<format>`), which caps the width,
//! fixes the output format and sidesteps origin restrictions of the catalog
//! host. Embedded `data:` images are returned unchanged without any network
//! traffic.

use crate::error::PipelineError;
use crate::payload::ImagePayload;
use crate::types::ImageLocator;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info};

#[async_trait]
pub trait ProductImageSource: Send + Sync {
    async fn fetch(&self, locator: &ImageLocator) -> Result<ImagePayload, PipelineError>;
}

/// Resize-proxy parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub endpoint: Url,
    pub width: u32,
    /// Output format understood by the proxy, e.g. `jpg` or `png`.
    pub format: String,
}

impl ProxySettings {
    /// Proxy URL for `source`.
    pub fn proxied_url(&self, source: &Url) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("url", source.as_str())
            .append_pair("w", &self.width.to_string())
            .append_pair("output", &self.format);
        url
    }
}

/// Fetches remote product images through the resize proxy.
pub struct ProxyImageFetcher {
    client: Client,
    settings: ProxySettings,
}

impl ProxyImageFetcher {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(settings: ProxySettings, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, settings })
    }

    async fn fetch_remote(&self, source: &Url) -> Result<ImagePayload, PipelineError> {
        let url = self.settings.proxied_url(source);
        debug!(%source, proxy = %url, "fetching product image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Network(format!("Failed to fetch product image: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Network(format!(
                "Failed to fetch product image: status {}",
                status.as_u16()
            )));
        }
        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Network(format!("Failed to read product image: {e}")))?;

        let payload = image_payload(header_mime.as_deref(), body.to_vec())?;
        info!(
            %source,
            mime_type = payload.mime_type(),
            bytes = payload.data().len(),
            "product image fetched"
        );
        Ok(payload)
    }
}

/// Accept `body` only if its signature is a known image format; the MIME
/// type comes from that signature, not from the content type header.
fn image_payload(header: Option<&str>, body: Vec<u8>) -> Result<ImagePayload, PipelineError> {
    let format = image::guess_format(&body).map_err(|_| {
        PipelineError::Decode(format!(
            "Product image is not a recognizable image (content type {})",
            header.unwrap_or("missing")
        ))
    })?;
    Ok(ImagePayload::new(format.to_mime_type(), body))
}

#[async_trait]
impl ProductImageSource for ProxyImageFetcher {
    async fn fetch(&self, locator: &ImageLocator) -> Result<ImagePayload, PipelineError> {
        match locator {
            ImageLocator::Embedded(payload) => Ok(payload.clone()),
            ImageLocator::Remote(url) => self.fetch_remote(url).await,
        }
    }
}
