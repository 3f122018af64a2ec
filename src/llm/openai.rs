//! OpenAI Responses API backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::backend::{ModelBackend, ModelResponse};
use crate::error::BackendError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl ResponsesResponse {
    /// Concatenated `output_text` items across all output messages.
    fn text(self) -> Option<String> {
        let texts: Vec<String> = self
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|c| c.kind == "output_text")
            .filter_map(|c| c.text)
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Calls `POST {base}/responses`.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(BackendError::Configuration(
                "OpenAI API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<ModelResponse, BackendError> {
        let url = format!("{}/responses", self.base_url);
        let request = ResponsesRequest {
            model,
            instructions: system_instruction,
            input: prompt,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::from_transport(e, self.timeout))?;

        if !status.is_success() {
            return Err(BackendError::from_status_and_body(status.as_u16(), &body));
        }

        let parsed: ResponsesResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::ParseFailed(format!("OpenAI response: {e}")))?;

        Ok(ModelResponse {
            text: parsed.text(),
        })
    }
}
