use super::GenerationBackend;
use super::dto::{GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use crate::config::AppConfig;
use crate::credentials::CredentialProvider;
use crate::error::PipelineError;
use crate::imaging::ImageNormalizer;
use crate::payload::ImagePayload;
use crate::retry::{RetryPolicy, invoke};
use crate::types::{Product, Size};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Models, retry policy and normalization bounds for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub size_model: String,
    pub image_model: String,
    pub retry: RetryPolicy,
    /// Longer-edge bound for the size-estimation photo.
    pub size_estimate_edge: u32,
    /// Longer-edge bound for both composite inputs.
    pub composite_edge: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl GenerationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            size_model: config.backend.size_model.clone(),
            image_model: config.backend.image_model.clone(),
            retry: RetryPolicy {
                retries: config.retry.retries,
                base_delay: Duration::from_millis(config.retry.base_delay_ms),
            },
            size_estimate_edge: config.images.size_estimate_edge,
            composite_edge: config.images.composite_edge,
        }
    }
}

/// Instruction for the size-classification call.
pub fn size_prompt(product_name: &str) -> String {
    format!(
        "Look at the person in this photo and estimate their body build. \
         Recommend the best clothing size for the product \"{product_name}\". \
         Choose exactly one of: XS, S, M, L, XL, XXL. \
         Respond with the size code only, nothing else."
    )
}

/// Instruction set for the composite call.
pub fn compose_prompt(product: &Product) -> String {
    format!(
        "You are a virtual fitting room. The first image is a photo of a person. \
         The second image is a clothing product: \"{name}\" ({description}).\n\
         Generate a photorealistic image of the same person wearing this product.\n\
         Requirements:\n\
         1. Keep the person's face, hair, body shape, skin tone and pose exactly as in the first image.\n\
         2. Keep the original background and lighting.\n\
         3. Reproduce the product's colour, pattern, fabric, logos and details exactly as shown in the second image.\n\
         4. Fit the garment naturally to the person's body with realistic folds and shadows.\n\
         5. Replace only the clothing the product would cover.\n\
         Return only the resulting image.",
        name = product.name,
        description = product.description,
    )
}

/// Issues the size-estimation and composite calls.
///
/// Holds no key: every call asks the [`CredentialProvider`] first, so a key
/// changed between calls is used by the next one.
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    credentials: Arc<dyn CredentialProvider>,
    normalizer: ImageNormalizer,
    settings: GenerationSettings,
}

impl GenerationClient {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        credentials: Arc<dyn CredentialProvider>,
        normalizer: ImageNormalizer,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            backend,
            credentials,
            normalizer,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Classify the person's build into a [`Size`] for `product_name`.
    pub async fn estimate_size(
        &self,
        user_image: &ImagePayload,
        product_name: &str,
    ) -> Result<Size, PipelineError> {
        let image = self
            .normalizer
            .normalize(user_image, self.settings.size_estimate_edge)
            .await?;
        let request = GenerateContentRequest::user(vec![
            Part::image(&image),
            Part::text(size_prompt(product_name)),
        ]);

        let response = self
            .call("estimate_size", &self.settings.size_model, &request)
            .await?;
        let text = response.text();
        let size = Size::from_response(&text);
        info!(response = %text.trim(), %size, "size estimated");
        Ok(size)
    }

    /// Render the user wearing `product`.
    pub async fn compose_try_on(
        &self,
        user_image: &ImagePayload,
        product_image: &ImagePayload,
        product: &Product,
    ) -> Result<ImagePayload, PipelineError> {
        let edge = self.settings.composite_edge;
        let person = self.normalizer.normalize(user_image, edge).await?;
        let garment = self.normalizer.normalize(product_image, edge).await?;
        let request = GenerateContentRequest::user(vec![
            Part::image(&person),
            Part::image(&garment),
            Part::text(compose_prompt(product)),
        ])
        .with_config(GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
        });

        let response = self
            .call("compose_try_on", &self.settings.image_model, &request)
            .await?;
        if response.is_safety_blocked() {
            warn!(product = %product.id, "composite blocked by safety filter");
            return Err(PipelineError::content_rejected());
        }

        let Some(inline) = response.first_inline_data() else {
            warn!(product = %product.id, "composite response carried no image");
            return Err(PipelineError::generation_failed());
        };
        let composite = ImagePayload::from_base64(&inline.mime_type, &inline.data)
            .map_err(|e| PipelineError::GenerationFailed(format!("Unusable image data: {e}")))?;
        info!(
            product = %product.id,
            mime_type = composite.mime_type(),
            bytes = composite.data().len(),
            "composite generated"
        );
        Ok(composite)
    }

    async fn call(
        &self,
        label: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, PipelineError> {
        let Some(api_key) = self.credentials.api_key() else {
            warn!(operation = label, "no API key available");
            return Err(PipelineError::credential());
        };
        let api_key = api_key.as_str();
        let backend = self.backend.as_ref();

        let response = invoke(&self.settings.retry, label, || {
            backend.generate_content(api_key, model, request)
        })
        .await?;
        Ok(response)
    }
}
