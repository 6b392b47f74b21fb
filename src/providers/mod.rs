//! Text-generation providers and the fallback chain over them.
//!
//! Each provider wraps one hosted or local generation API behind the
//! `TextProvider` trait; `ProviderRegistry` runs a request against the
//! active provider and falls back down the list on exhaustion-class
//! failures.

pub mod gemini;
pub mod ollama;
pub mod registry;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Quota and rate-limit failures are the fallback triggers: they move
    /// the registry's sticky active pointer. Every other class leaves the
    /// pointer in place.
    pub fn exhausts_provider(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_) | Self::RateLimited(_))
    }
}

/// Classify a non-success HTTP response from a generation API.
///
/// 429 means rate-limited; a payload that names its quota ("quota",
/// "RESOURCE_EXHAUSTED", "rate limit") means the allowance is gone for the
/// session, which is the stronger signal and wins over the status code.
pub(crate) fn classify_http_failure(status: u16, body: &str) -> ProviderError {
    let lowered = body.to_lowercase();
    let quota_marked = lowered.contains("quota")
        || body.contains("RESOURCE_EXHAUSTED")
        || lowered.contains("rate limit");

    if quota_marked {
        ProviderError::QuotaExceeded(truncate_message(body))
    } else if status == 429 {
        ProviderError::RateLimited(truncate_message(body))
    } else {
        ProviderError::Provider {
            status,
            message: truncate_message(body),
        }
    }
}

/// Error payloads can be whole HTML pages; keep logs and error chains sane.
fn truncate_message(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut end = MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &trimmed[..end])
    }
}

/// Sampling parameters sent with every generation call, fixed per provider.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// One hosted or local text-generation API.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Computed once at construction. Callers check this before relying on
    /// a provider; an unconfigured provider still answers `generate` with
    /// `ProviderError::NotConfigured` rather than panicking.
    fn is_configured(&self) -> bool;

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Scriptable provider for tests. Emits queued errors first, then the
/// resting response (if any) on every subsequent call.
pub struct MockProvider {
    name: &'static str,
    configured: bool,
    resting: Option<String>,
    script: Mutex<VecDeque<ProviderError>>,
}

impl MockProvider {
    pub fn succeeding(name: &'static str, text: &str) -> Self {
        Self {
            name,
            configured: true,
            resting: Some(text.to_string()),
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn unconfigured(name: &'static str) -> Self {
        Self {
            name,
            configured: false,
            resting: None,
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue an error to be returned before the resting response.
    pub fn then_error(self, error: ProviderError) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
        self
    }

    pub fn failing(name: &'static str, errors: Vec<ProviderError>) -> Self {
        Self {
            name,
            configured: true,
            resting: None,
            script: Mutex::new(errors.into()),
        }
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured(self.name.to_string()));
        }
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match scripted {
            Some(error) => Err(error),
            None => match &self.resting {
                Some(text) => Ok(text.clone()),
                None => Err(ProviderError::Provider {
                    status: 500,
                    message: "mock script exhausted".to_string(),
                }),
            },
        }
    }
}
