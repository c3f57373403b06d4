//! Gemini `generateContent` client.

use crate::error::AssistantError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// generateContent request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    pub fn new(prompt: &str, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// generateContent response body.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
    pub fn into_text(self) -> Result<String, AssistantError> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AssistantError::InvalidResponse("no candidate text".to_string()))
    }
}

/// HTTP client bound to one endpoint and key.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    timeout_seconds: u64,
}

impl GeminiClient {
    pub fn new(
        api_url: &str,
        api_key: &str,
        temperature: f32,
        max_tokens: u32,
        timeout_seconds: u64,
    ) -> Result<Self, AssistantError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            temperature,
            max_tokens,
            timeout_seconds,
        })
    }

    /// Send `prompt` and return the generated text.
    pub async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let request = GenerateRequest::new(prompt, self.temperature, self.max_tokens);
        debug!("Sending generateContent request ({} chars)", prompt.len());

        let response = self
            .http_client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AssistantError::Timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    AssistantError::Connect(self.api_url.clone())
                } else {
                    AssistantError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;

        parsed.into_text()
    }
}
