use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderSettings;

use super::{classify_http_failure, GenerationOptions, ProviderError, TextProvider};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Hosted Gemini client, the primary provider in the default chain.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    options: GenerationOptions,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            options: GenerationOptions::default(),
            timeout_secs,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(
            settings.gemini_api_key.clone(),
            &settings.gemini_model,
            settings.request_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for `models/{model}:generateContent`
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f64,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Response body; generated text sits at `candidates[0].content.parts[*].text`.
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

#[async_trait]
impl TextProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("gemini".to_string()))?;

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.options.temperature,
                top_k: self.options.top_k,
                top_p: self.options.top_p,
                max_output_tokens: self.options.max_output_tokens,
            },
        };

        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
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

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            ProviderError::Provider {
                status: status.as_u16(),
                message: format!("response was not valid JSON: {e}"),
            }
        })?;

        // Some failures come back with HTTP 200 and an error object instead.
        if let Some(error) = parsed.error {
            let message = error
                .message
                .or(error.status)
                .unwrap_or_else(|| "unspecified Gemini error".to_string());
            return Err(classify_http_failure(error.code.unwrap_or(200), &message));
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .find_map(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::Provider {
                status: status.as_u16(),
                message: "response missing generated text".to_string(),
            });
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_means_unconfigured() {
        let client = GeminiClient::new(None, "gemini-1.5-flash", 30);
        assert!(!client.is_configured());
    }

    #[test]
    fn blank_key_means_unconfigured() {
        let client = GeminiClient::new(Some("  ".into()), "gemini-1.5-flash", 30);
        assert!(!client.is_configured());
    }

    #[test]
    fn present_key_means_configured() {
        let client = GeminiClient::new(Some("k".into()), "gemini-1.5-flash", 30);
        assert!(client.is_configured());
        assert_eq!(client.name(), "gemini");
        assert_eq!(client.model(), "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn unconfigured_generate_fails_without_network() {
        let client = GeminiClient::new(None, "gemini-1.5-flash", 30);
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn request_body_uses_camel_case_generation_config() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: "hi" }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 1024,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["temperature"], 0.7);
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn response_text_extracted_from_fixed_path() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ]
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .find_map(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn error_object_deserializes() {
        let raw = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let error = parsed.error.unwrap();
        assert_eq!(error.code, Some(429));
        assert_eq!(error.message.as_deref(), Some("Quota exceeded"));
    }
}
