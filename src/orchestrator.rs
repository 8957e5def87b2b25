//! Try-On Orchestrator: drives one attempt from inputs to a published outcome.
//!
//! ```text
//! Idle → FetchingProduct → EstimatingSize → Rendering → Succeeded
//!              │                 │              │
//!              └─────────────────┴──────────────┴──────→ Failed
//! ```
//!
//! Stages run strictly in order. The product image is fetched before either
//! backend call, and size estimation completes before rendering starts. A
//! pacing delay runs alongside size estimation so the "Estimating size" stage
//! stays visible for a minimum time. A failed estimate ends the stage at
//! once.
//!
//! Every transition is published on a [`watch`] channel of [`TryOnState`].
//! Consumers call [`TryOnOrchestrator::subscribe`] and render progress from
//! the stage label; no polling of internals is needed.
//!
//! One orchestrator serves both the free and the credential-gated flow. With
//! `requires_key_selection` set, the [`KeySelector`] is consulted before the
//! attempt starts. In both flows a `CredentialError` raises the selector
//! before `Failed` is published, so re-authentication is prompted before any
//! retry.
//!
//! There is no cancellation: an attempt runs to completion. [`reset`] only
//! discards the published outcome.
//!
//! [`reset`]: TryOnOrchestrator::reset

use crate::credentials::KeySelector;
use crate::error::PipelineError;
use crate::fetch::ProductImageSource;
use crate::generation::GenerationClient;
use crate::payload::ImagePayload;
use crate::types::{Product, TryOnRequest, TryOnResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default pacing applied while estimating size.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    #[default]
    Idle,
    FetchingProduct,
    EstimatingSize,
    Rendering,
    Succeeded,
    Failed,
}

impl Stage {
    /// User-facing progress label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::FetchingProduct => "Fetching product",
            Stage::EstimatingSize => "Estimating size",
            Stage::Rendering => "Rendering",
            Stage::Succeeded => "Done",
            Stage::Failed => "Failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Succeeded | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot published on every transition.
///
/// `result` is only set in `Succeeded` and `error` only in `Failed`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TryOnState {
    pub stage: Stage,
    pub result: Option<TryOnResult>,
    pub error: Option<PipelineError>,
}

impl TryOnState {
    fn at(stage: Stage) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }
}

pub struct TryOnOrchestrator {
    source: Arc<dyn ProductImageSource>,
    client: GenerationClient,
    selector: Arc<dyn KeySelector>,
    pacing: Duration,
    requires_key_selection: bool,
    state: watch::Sender<TryOnState>,
}

impl TryOnOrchestrator {
    pub fn new(
        source: Arc<dyn ProductImageSource>,
        client: GenerationClient,
        selector: Arc<dyn KeySelector>,
    ) -> Self {
        let (state, _) = watch::channel(TryOnState::default());
        Self {
            source,
            client,
            selector,
            pacing: DEFAULT_PACING,
            requires_key_selection: false,
            state,
        }
    }

    /// Minimum time spent in `EstimatingSize`. Zero disables pacing.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Credential-gated flow: ask the selector before each attempt.
    pub fn requiring_key_selection(mut self, required: bool) -> Self {
        self.requires_key_selection = required;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<TryOnState> {
        self.state.subscribe()
    }

    pub fn stage(&self) -> Stage {
        self.state.borrow().stage
    }

    pub fn state(&self) -> TryOnState {
        self.state.borrow().clone()
    }

    /// Return to `Idle`, discarding any result or error.
    ///
    /// Does not abort an attempt that is still in flight.
    pub fn reset(&self) {
        self.state.send_replace(TryOnState::default());
        debug!("try-on state reset");
    }

    /// Start an attempt if both inputs are present.
    ///
    /// Returns `None` without touching the state when either is missing.
    pub async fn start(
        &self,
        user_image: Option<&ImagePayload>,
        product: Option<&Product>,
    ) -> Option<Result<TryOnResult, PipelineError>> {
        let (Some(user_image), Some(product)) = (user_image, product) else {
            debug!("try-on not started: photo or product missing");
            return None;
        };
        Some(self.attempt(user_image, product).await)
    }

    /// Run one attempt for a complete request.
    pub async fn run(&self, request: &TryOnRequest) -> Result<TryOnResult, PipelineError> {
        self.attempt(&request.user_image, &request.product).await
    }

    async fn attempt(
        &self,
        user_image: &ImagePayload,
        product: &Product,
    ) -> Result<TryOnResult, PipelineError> {
        if self.requires_key_selection && !self.selector.has_selected_key().await {
            info!("no key selected; opening key selection");
            self.selector.open_select_key().await;
        }

        match self.stages(user_image, product).await {
            Ok(result) => {
                info!(product = %product.id, size = %result.size, "try-on succeeded");
                self.publish(TryOnState {
                    stage: Stage::Succeeded,
                    result: Some(result.clone()),
                    error: None,
                })
                .await;
                Ok(result)
            }
            Err(error) => {
                warn!(product = %product.id, kind = %error.kind(), %error, "try-on failed");
                if error.is_credential() {
                    self.selector.open_select_key().await;
                }
                self.publish(TryOnState {
                    stage: Stage::Failed,
                    result: None,
                    error: Some(error.clone()),
                })
                .await;
                Err(error)
            }
        }
    }

    async fn stages(
        &self,
        user_image: &ImagePayload,
        product: &Product,
    ) -> Result<TryOnResult, PipelineError> {
        self.publish(TryOnState::at(Stage::FetchingProduct)).await;
        let product_image = self.source.fetch(&product.image).await?;

        self.publish(TryOnState::at(Stage::EstimatingSize)).await;
        let (size, ()) = tokio::try_join!(
            self.client.estimate_size(user_image, &product.name),
            async {
                tokio::time::sleep(self.pacing).await;
                Ok::<(), PipelineError>(())
            },
        )?;

        self.publish(TryOnState::at(Stage::Rendering)).await;
        let composite = self
            .client
            .compose_try_on(user_image, &product_image, product)
            .await?;

        Ok(TryOnResult { composite, size })
    }

    /// Replace the published state, then yield so watchers on the same
    /// thread observe each stage rather than only the last one.
    async fn publish(&self, state: TryOnState) {
        info!(stage = %state.stage, "try-on stage");
        self.state.send_replace(state);
        tokio::task::yield_now().await;
    }
}
