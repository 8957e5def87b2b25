//! # Fitting Room
//!
//! A virtual try-on pipeline. Given a photo of a person and a catalog
//! product, it recommends a garment size and renders the person wearing the
//! product, using a generative image backend for both.
//!
//! # Architecture: One Attempt, Four Stages
//!
//! ```text
//! Idle → Fetching product → Estimating size → Rendering → Done | Failed
//! ```
//!
//! Four components, leaf first:
//!
//! - **Image normalizer** ([`imaging`]): decodes any supported input and
//!   re-encodes it as a bounded JPEG before it goes over the wire.
//! - **Resilient invoker** ([`retry`]): runs one backend call, retrying
//!   rate-limit failures with doubling backoff and classifying the rest.
//! - **Generation client** ([`generation`]): the two backend operations,
//!   size estimation and try-on compositing.
//! - **Try-on orchestrator** ([`orchestrator`]): the state machine that
//!   sequences one attempt and publishes each stage.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `Product`, `ImageLocator`, `Size`, `TryOnRequest`, `TryOnResult` |
//! | [`payload`] | `ImagePayload` and its `data:` URI form |
//! | [`error`] | `PipelineError` taxonomy and user-facing messages |
//! | [`imaging`] | Normalization: dimension maths, `image` crate backend, async wrapper |
//! | [`fetch`] | Product image resolution through a resize proxy |
//! | [`retry`] | Retry policy, failure classification, `invoke` |
//! | [`credentials`] | API key provider and key-selection side channel |
//! | [`generation`] | `generateContent` wire types, HTTP backend, `GenerationClient` |
//! | [`orchestrator`] | Stage machine with a `watch` channel of `TryOnState` |
//! | [`catalog`] | Product catalog loaded from TOML |
//! | [`config`] | `fitting-room.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Keys Are Read Per Call
//!
//! The API key may change while the process runs (a user selects a new
//! one after a credential failure). The generation client holds a
//! [`credentials::CredentialProvider`] rather than a key, and asks it on every
//! operation, so the next call picks up the change without a restart.
//!
//! ## Loose Error Classification
//!
//! The backend does not promise a stable machine-readable error taxonomy.
//! Failures are classified by HTTP status and a short, fixed list of message
//! substrings (`429`, `RESOURCE_EXHAUSTED`, `quota`, `Requested entity was
//! not found`, `API key not valid`). See [`retry::classify`].
//!
//! ## One Orchestrator for Both Flows
//!
//! The free flow and the credential-gated flow differ only in whether the
//! key selector is consulted before an attempt. A single
//! [`orchestrator::TryOnOrchestrator`] takes that as a flag.
//!
//! ## Collaborators Behind Traits
//!
//! The pixel work ([`imaging::ImageBackend`]), the backend transport
//! ([`generation::GenerationBackend`]), the product image source
//! ([`fetch::ProductImageSource`]) and the key selector
//! ([`credentials::KeySelector`]) are traits. Tests drive the whole pipeline
//! with recording mocks and a paused clock, so backoff timing is asserted
//! exactly without network access or real sleeping.

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod generation;
pub mod imaging;
pub mod orchestrator;
pub mod output;
pub mod payload;
pub mod retry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
