//! Client abstraction for the external generative reasoning service.
//!
//! Synthesis and fact-checking both consume the service as a black box:
//! instruction plus prompt in, free text out. Structured validation of the
//! text happens at the call sites, never here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::ReasoningError;

/// Black-box generative reasoning call.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Issue one generation request. Implementations must not retry
    /// internally; retry policy belongs to the orchestrator.
    async fn generate(&self, instruction: &str, prompt: &str) -> Result<String, ReasoningError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// HTTP client for a reasoning gateway speaking a minimal JSON contract:
/// `POST {model, system, prompt}` returning `{"text": "..."}`.
pub struct HttpReasoning {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpReasoning {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[async_trait]
impl ReasoningService for HttpReasoning {
    async fn generate(&self, instruction: &str, prompt: &str) -> Result<String, ReasoningError> {
        let body = GenerateRequest {
            model: &self.model,
            system: instruction,
            prompt,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReasoningError::Status {
                code: status.as_u16(),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::MalformedResponse(e.to_string()))?;
        Ok(parsed.text)
    }
}

/// Stand-in used when no reasoning endpoint is configured. Every call
/// fails as unavailable, so synthesis and fact-checking run in their
/// knowledge-base fallback modes.
pub struct UnconfiguredReasoning;

#[async_trait]
impl ReasoningService for UnconfiguredReasoning {
    async fn generate(&self, _instruction: &str, _prompt: &str) -> Result<String, ReasoningError> {
        Err(ReasoningError::Unavailable(
            "no reasoning endpoint configured".to_string(),
        ))
    }
}

/// Strip markdown code fences that models habitually wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
