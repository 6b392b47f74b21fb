use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderSettings;

use super::{classify_http_failure, GenerationOptions, ProviderError, TextProvider};

/// Local Ollama client, the fallback provider in the default chain.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerationOptions,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options: GenerationOptions::default(),
            timeout_secs,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(
            &settings.ollama_base_url,
            &settings.ollama_model,
            settings.request_timeout_secs,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Installed model names from `/api/tags`, for the status surface.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status.as_u16(), &body));
        }

        let parsed: OllamaTagsResponse =
            response.json().await.map_err(|e| ProviderError::Provider {
                status: status.as_u16(),
                message: format!("tags response was not valid JSON: {e}"),
            })?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Request body for `/api/generate`
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    num_predict: u32,
}

/// Response body from `/api/generate`
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[async_trait]
impl TextProvider for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.model.is_empty()
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured("ollama".to_string()));
        }

        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.options.temperature,
                top_k: self.options.top_k,
                top_p: self.options.top_p,
                num_predict: self.options.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::Network(format!("cannot reach Ollama at {}", self.base_url))
                } else if e.is_timeout() {
                    ProviderError::Network(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status.as_u16(), &body));
        }

        let parsed: OllamaGenerateResponse =
            response.json().await.map_err(|e| ProviderError::Provider {
                status: status.as_u16(),
                message: format!("response was not valid JSON: {e}"),
            })?;

        if parsed.response.trim().is_empty() {
            return Err(ProviderError::Provider {
                status: status.as_u16(),
                message: "response missing generated text".to_string(),
            });
        }

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3.1:8b", 60);
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3.1:8b");
    }

    #[test]
    fn default_construction_is_configured() {
        let client = OllamaClient::new("http://localhost:11434", "llama3.1:8b", 60);
        assert!(client.is_configured());
        assert_eq!(client.name(), "ollama");
    }

    #[test]
    fn empty_model_means_unconfigured() {
        let client = OllamaClient::new("http://localhost:11434", "", 60);
        assert!(!client.is_configured());
    }

    #[test]
    fn generate_request_carries_sampling_options() {
        let body = OllamaGenerateRequest {
            model: "llama3.1:8b",
            prompt: "hi",
            stream: false,
            options: OllamaOptions {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                num_predict: 1024,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1024);
        assert_eq!(json["options"]["temperature"], 0.7);
    }

    #[test]
    fn tags_response_parses_model_names() {
        let raw = r#"{"models": [{"name": "llama3.1:8b"}, {"name": "medgemma:4b"}]}"#;
        let parsed: OllamaTagsResponse = serde_json::from_str(raw).unwrap();
        let names: Vec<String> = parsed.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llama3.1:8b", "medgemma:4b"]);
    }
}
