//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::prompt::{classification_prompt, parse_classification, summary_prompt};
use super::{LlmError, Summarizer, TextClassifier};
use crate::config::LlmConfig;
use crate::memory::types::ContextEntry;

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    categories: Vec<String>,
}

impl GeminiClient {
    /// Build a client for `config.model`. `categories` bounds what
    /// [`TextClassifier::classify`] may answer.
    pub fn new(config: &LlmConfig, categories: Vec<String>) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Unavailable("no API key configured".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
            categories,
        })
    }

    /// Send one prompt and return the first candidate's text.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unavailable>".into());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = serde_json::from_str(&response.text().await?)?;
        let text = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl TextClassifier for GeminiClient {
    async fn classify(&self, text: &str) -> Result<String, LlmError> {
        let reply = self.generate(&classification_prompt(text, &self.categories)).await?;
        let category = parse_classification(&reply, &self.categories)?;
        tracing::debug!(category = %category, "gemini classified query");
        Ok(category)
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(
        &self,
        category: &str,
        entries: &[ContextEntry],
        query: &str,
    ) -> Result<String, LlmError> {
        let summary = self.generate(&summary_prompt(category, entries, query)).await?;
        tracing::debug!(category = %category, entries = entries.len(), "gemini synthesized answer");
        Ok(summary)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
