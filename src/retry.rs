//! Resilient invoker: classification-driven retry with exponential backoff.
//!
//! The generation backend does not promise a machine-readable error
//! taxonomy, so failures are classified by matching a small fixed set of
//! substrings and status codes:
//!
//! | Class | Signals | Behaviour |
//! |---|---|---|
//! | credential | `Requested entity was not found`, `API key not valid` | abort, never retried |
//! | retryable | status 429, `429`, `RESOURCE_EXHAUSTED`, `quota` | retry with doubling delay |
//! | fatal | anything else | propagate immediately |
//!
//! Credential markers are checked first: a message that mentions both is a
//! credential problem, since retrying it cannot help.

use crate::error::PipelineError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const CREDENTIAL_MARKERS: &[&str] = &["requested entity was not found", "api key not valid"];
const RATE_LIMIT_MARKERS: &[&str] = &["429", "resource_exhausted", "quota"];

/// One failed call as reported by the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CallFailure {
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl CallFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Credential,
    Retryable,
    Fatal,
}

pub fn classify(failure: &CallFailure) -> FailureClass {
    let message = failure.message.to_lowercase();
    if CREDENTIAL_MARKERS.iter().any(|m| message.contains(m)) {
        return FailureClass::Credential;
    }
    if failure.status == Some(429) || RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m)) {
        return FailureClass::Retryable;
    }
    FailureClass::Fatal
}

/// Retry budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay between attempt `attempt` and `attempt + 1` (1-based):
    /// `base_delay * 2^(attempt - 1)`. No jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("credential rejected: {0}")]
    Credential(CallFailure),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: CallFailure },
    #[error("{0}")]
    Fatal(CallFailure),
}

impl From<InvokeError> for PipelineError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Credential(_) => PipelineError::credential(),
            InvokeError::Exhausted { .. } => PipelineError::server_busy(),
            InvokeError::Fatal(failure) => PipelineError::Network(failure.message),
        }
    }
}

/// Run `op` under `policy`.
///
/// Invokes `op` at most `policy.retries + 1` times and returns the first
/// success. `label` only names the operation in logs.
pub async fn invoke<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, InvokeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallFailure>>,
{
    let mut attempt = 1;
    loop {
        let failure = match op().await {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        match classify(&failure) {
            FailureClass::Credential => {
                warn!(operation = label, attempt, error = %failure, "credential rejected, not retrying");
                return Err(InvokeError::Credential(failure));
            }
            FailureClass::Fatal => return Err(InvokeError::Fatal(failure)),
            FailureClass::Retryable if attempt > policy.retries => {
                warn!(operation = label, attempts = attempt, error = %failure, "retry budget exhausted");
                return Err(InvokeError::Exhausted {
                    attempts: attempt,
                    last: failure,
                });
            }
            FailureClass::Retryable => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
