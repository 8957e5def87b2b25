//! Backend credential capability and the credential-selection side channel.
//!
//! The API key is process-wide state that may change between calls. The
//! generation client never caches it: it asks its [`CredentialProvider`] on
//! every backend call, so a newly selected key takes effect on the very next
//! invocation.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Supplies the current API key at call time.
pub trait CredentialProvider: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

/// External collaborator that lets the user pick a key.
#[async_trait]
pub trait KeySelector: Send + Sync {
    async fn has_selected_key(&self) -> bool;

    /// Prompt for (re)selection. Returns once the prompt has been raised.
    async fn open_select_key(&self);
}

/// Reads the key from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// A terminal has no key picker; the best it can do is say where the key goes.
#[async_trait]
impl KeySelector for EnvCredentials {
    async fn has_selected_key(&self) -> bool {
        self.api_key().is_some()
    }

    async fn open_select_key(&self) {
        warn!(
            variable = %self.var,
            "a valid API key is required: export {} and run again", self.var
        );
    }
}

/// In-memory key cell that can be swapped while the pipeline is running.
#[derive(Debug, Clone, Default)]
pub struct SharedCredential {
    key: Arc<RwLock<Option<String>>>,
}

impl SharedCredential {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: Arc::new(RwLock::new(key)),
        }
    }

    pub fn set(&self, key: Option<String>) {
        match self.key.write() {
            Ok(mut guard) => *guard = key,
            Err(poisoned) => *poisoned.into_inner() = key,
        }
    }
}

impl CredentialProvider for SharedCredential {
    fn api_key(&self) -> Option<String> {
        match self.key.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
