use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;

use crate::config::ProviderSettings;

use super::gemini::GeminiClient;
use super::ollama::OllamaClient;
use super::{ProviderError, TextProvider};

/// One recorded failure from a single `execute` call.
#[derive(Debug)]
pub struct ProviderAttempt {
    pub provider: String,
    pub error: ProviderError,
}

/// Every provider in the list failed (or was unconfigured) for one request.
#[derive(Debug, Error)]
#[error("all providers failed: {}", .attempts.iter().map(|a| format!("{} ({})", a.provider, a.error)).collect::<Vec<_>>().join("; "))]
pub struct AllProvidersFailed {
    pub attempts: Vec<ProviderAttempt>,
}

/// A successful generation, tagged with the provider that served it.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub provider: String,
}

/// Per-provider view for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub configured: bool,
    pub active: bool,
}

/// Ordered provider chain with a sticky active pointer.
///
/// The pointer is instance state, not module state: each registry instance
/// (typically one per engine) tracks its own fallback position. Concurrent
/// requests against one instance share it deliberately: a quota hit observed
/// by one request spares the next from re-hitting it.
///
/// Fallback is same-tick and sequential: no backoff, no jitter, no racing.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn TextProvider>>,
    active: Mutex<usize>,
}

impl ProviderRegistry {
    /// Build from an ordered list, primary first. An empty list is allowed
    /// and makes every `execute` fail over to the rule-based path.
    pub fn new(providers: Vec<Arc<dyn TextProvider>>) -> Self {
        Self {
            providers,
            active: Mutex::new(0),
        }
    }

    /// The default chain: hosted Gemini primary, local Ollama fallback.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(vec![
            Arc::new(GeminiClient::from_settings(settings)),
            Arc::new(OllamaClient::from_settings(settings)),
        ])
    }

    fn active_index(&self) -> usize {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_active(&self, idx: usize) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = idx;
    }

    /// Name of the provider the next request will start from.
    pub fn active_name(&self) -> Option<String> {
        self.providers
            .get(self.active_index())
            .map(|p| p.name().to_string())
    }

    /// Force the chain back to preferring the primary provider, e.g. after
    /// an operator believes quota has refreshed.
    pub fn reset_to_primary(&self) {
        self.set_active(0);
        tracing::info!("provider chain reset to primary");
    }

    /// Configured/active view over every descriptor in the chain.
    pub fn status(&self) -> Vec<ProviderStatus> {
        let active = self.active_index();
        self.providers
            .iter()
            .enumerate()
            .map(|(idx, p)| ProviderStatus {
                name: p.name().to_string(),
                configured: p.is_configured(),
                active: idx == active,
            })
            .collect()
    }

    /// Run one generation request against the chain.
    ///
    /// Starts at the active provider. Quota/rate-limit failures advance the
    /// sticky pointer (clamped at the end of the list, no wrapping) and the
    /// next provider is tried immediately. Other failure classes also move
    /// on to the next provider for this request, but leave the pointer
    /// where it was. Success pins the pointer on the provider that served
    /// the request.
    pub async fn execute(&self, prompt: &str) -> Result<Generated, AllProvidersFailed> {
        let start = self.active_index();
        let mut attempts = Vec::new();

        for idx in start..self.providers.len() {
            let provider = &self.providers[idx];

            if !provider.is_configured() {
                attempts.push(ProviderAttempt {
                    provider: provider.name().to_string(),
                    error: ProviderError::NotConfigured(provider.name().to_string()),
                });
                continue;
            }

            tracing::debug!(provider = provider.name(), "dispatching generation request");
            match provider.generate(prompt).await {
                Ok(text) => {
                    self.set_active(idx);
                    tracing::debug!(
                        provider = provider.name(),
                        chars = text.len(),
                        "generation succeeded"
                    );
                    return Ok(Generated {
                        text,
                        provider: provider.name().to_string(),
                    });
                }
                Err(error) => {
                    if error.exhausts_provider() {
                        let next = (idx + 1).min(self.providers.len().saturating_sub(1));
                        self.set_active(next);
                        tracing::warn!(
                            provider = provider.name(),
                            error = %error,
                            "provider exhausted, falling back"
                        );
                    } else {
                        tracing::warn!(
                            provider = provider.name(),
                            error = %error,
                            "provider failed, trying next for this request"
                        );
                    }
                    attempts.push(ProviderAttempt {
                        provider: provider.name().to_string(),
                        error,
                    });
                }
            }
        }

        Err(AllProvidersFailed { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    fn quota(msg: &str) -> ProviderError {
        ProviderError::QuotaExceeded(msg.to_string())
    }

    fn network(msg: &str) -> ProviderError {
        ProviderError::Network(msg.to_string())
    }

    #[tokio::test]
    async fn healthy_primary_serves_and_stays_active() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(MockProvider::succeeding("gemini", "primary text")),
            Arc::new(MockProvider::succeeding("ollama", "fallback text")),
        ]);

        let generated = registry.execute("prompt").await.unwrap();
        assert_eq!(generated.text, "primary text");
        assert_eq!(generated.provider, "gemini");
        assert_eq!(registry.active_name().as_deref(), Some("gemini"));
    }

    #[tokio::test]
    async fn quota_failure_falls_back_and_sticks() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(MockProvider::succeeding("gemini", "primary text").then_error(quota("gone"))),
            Arc::new(MockProvider::succeeding("ollama", "fallback text")),
        ]);

        let generated = registry.execute("prompt").await.unwrap();
        assert_eq!(generated.text, "fallback text");
        assert_eq!(generated.provider, "ollama");
        // Sticky: the next call starts from the fallback, not the primary.
        assert_eq!(registry.active_name().as_deref(), Some("ollama"));

        let again = registry.execute("prompt").await.unwrap();
        assert_eq!(again.provider, "ollama");
    }

    #[tokio::test]
    async fn non_quota_failure_tries_next_but_keeps_pointer() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(MockProvider::failing("gemini", vec![network("down"), network("down")])),
            Arc::new(MockProvider::failing("ollama", vec![network("down"), network("down")])),
        ]);

        let err = registry.execute("prompt").await.unwrap_err();
        assert_eq!(err.attempts.len(), 2);
        // Pointer did not move: a network failure is not an exhaustion signal.
        assert_eq!(registry.active_name().as_deref(), Some("gemini"));

        // The next request starts back at the primary and tries both again.
        let err = registry.execute("prompt").await.unwrap_err();
        assert_eq!(err.attempts.len(), 2);
    }

    #[tokio::test]
    async fn exhaustion_aggregates_attempts_and_clamps_pointer() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(MockProvider::failing("gemini", vec![quota("gone")])),
            Arc::new(MockProvider::failing("ollama", vec![quota("gone"), quota("gone")])),
        ]);

        let err = registry.execute("prompt").await.unwrap_err();
        assert_eq!(err.attempts.len(), 2);
        assert_eq!(err.attempts[0].provider, "gemini");
        assert_eq!(err.attempts[1].provider, "ollama");

        // No wrapping: the pointer clamps at the last provider, so the next
        // request retries only the fallback.
        assert_eq!(registry.active_name().as_deref(), Some("ollama"));
        let err = registry.execute("prompt").await.unwrap_err();
        assert_eq!(err.attempts.len(), 1);
        assert_eq!(err.attempts[0].provider, "ollama");
    }

    #[tokio::test]
    async fn unconfigured_provider_is_skipped() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(MockProvider::unconfigured("gemini")),
            Arc::new(MockProvider::succeeding("ollama", "fallback text")),
        ]);

        let generated = registry.execute("prompt").await.unwrap();
        assert_eq!(generated.provider, "ollama");
    }

    #[tokio::test]
    async fn reset_to_primary_restores_the_chain() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(
                MockProvider::succeeding("gemini", "primary text").then_error(quota("gone")),
            ),
            Arc::new(MockProvider::succeeding("ollama", "fallback text")),
        ]);

        registry.execute("prompt").await.unwrap();
        assert_eq!(registry.active_name().as_deref(), Some("ollama"));

        registry.reset_to_primary();
        assert_eq!(registry.active_name().as_deref(), Some("gemini"));
        let generated = registry.execute("prompt").await.unwrap();
        assert_eq!(generated.provider, "gemini");
    }

    #[tokio::test]
    async fn empty_registry_fails_immediately() {
        let registry = ProviderRegistry::new(vec![]);
        let err = registry.execute("prompt").await.unwrap_err();
        assert!(err.attempts.is_empty());
        assert!(registry.active_name().is_none());
    }

    #[test]
    fn status_reports_configured_and_active_flags() {
        let registry = ProviderRegistry::new(vec![
            Arc::new(MockProvider::unconfigured("gemini")),
            Arc::new(MockProvider::succeeding("ollama", "text")),
        ]);

        let status = registry.status();
        assert_eq!(status.len(), 2);
        assert!(!status[0].configured);
        assert!(status[0].active);
        assert!(status[1].configured);
        assert!(!status[1].active);
    }
}
