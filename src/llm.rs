//! AI text service integration
//!
//! The engine only needs `generate(prompt) -> text`. `TextGenerator` is that
//! contract; `ClaudeClient` implements it against the hosted messages API.
//! Failures here (missing key, transport, API errors) are surfaced to the
//! caller as `AiServiceError`. Interpreting the returned text is the plan
//! parser's job, not this module's.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::AiServiceConfig;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const MESSAGES_PATH: &str = "v1/messages";
const API_VERSION: &str = "2023-06-01";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Serialize)]
pub enum AiServiceError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("Request timed out")]
  Timeout,

  #[error("API error: {0}")]
  Api(String),

  #[error("Invalid response from AI service: {0}")]
  InvalidResponse(String),
}

impl From<reqwest::Error> for AiServiceError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      AiServiceError::Timeout
    } else {
      AiServiceError::Request(e.to_string())
    }
  }
}

/// ---------------------------------------------------------------------------
/// Text Generation Contract
/// ---------------------------------------------------------------------------

/// An unreliable oracle: returns free-form text for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
  async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, AiServiceError>;
}

/// ---------------------------------------------------------------------------
/// Claude API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
  model: &'a str,
  max_tokens: u32,
  system: &'a str,
  messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
  content: Vec<ContentBlock>,
  #[allow(dead_code)]
  stop_reason: Option<String>,
  usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
  #[serde(rename = "type")]
  content_type: String,
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
  pub input_tokens: u32,
  pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
  error: ClaudeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Claude Client
/// ---------------------------------------------------------------------------

pub struct ClaudeClient {
  client: Client,
  api_key: String,
  endpoint: Url,
  model: String,
  max_tokens: u32,
}

impl ClaudeClient {
  /// Build a client from injected configuration. Fails when no API key is set.
  pub fn new(config: &AiServiceConfig) -> Result<Self, AiServiceError> {
    let api_key = config
      .api_key
      .clone()
      .ok_or(AiServiceError::MissingApiKey)?;

    let endpoint = config
      .base_url
      .join(MESSAGES_PATH)
      .map_err(|e| AiServiceError::Request(format!("Invalid endpoint: {}", e)))?;

    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| AiServiceError::Request(e.to_string()))?;

    Ok(Self {
      client,
      api_key,
      endpoint,
      model: config.model.clone(),
      max_tokens: config.max_tokens,
    })
  }

  /// Call Claude with a system prompt and user message
  pub async fn complete(
    &self,
    system_prompt: &str,
    user_message: &str,
  ) -> Result<(String, Option<Usage>), AiServiceError> {
    let request = ClaudeRequest {
      model: &self.model,
      max_tokens: self.max_tokens,
      system: system_prompt,
      messages: vec![ClaudeMessage {
        role: "user",
        content: user_message,
      }],
    };

    debug!(model = %self.model, prompt_chars = user_message.len(), "Sending AI request");

    let response = self
      .client
      .post(self.endpoint.clone())
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", API_VERSION)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      warn!(%status, "AI service returned an error");
      if let Ok(error_resp) = serde_json::from_str::<ClaudeErrorResponse>(&body) {
        return Err(AiServiceError::Api(error_resp.error.message));
      }
      return Err(AiServiceError::Api(format!("HTTP {}: {}", status, body)));
    }

    let claude_response: ClaudeResponse =
      serde_json::from_str(&body).map_err(|e| AiServiceError::InvalidResponse(e.to_string()))?;

    // Extract text from the first text content block
    let text = claude_response
      .content
      .iter()
      .find(|c| c.content_type == "text")
      .and_then(|c| c.text.clone())
      .ok_or_else(|| AiServiceError::InvalidResponse("No text content in response".to_string()))?;

    if let Some(usage) = &claude_response.usage {
      debug!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "AI request complete"
      );
    }

    Ok((text, claude_response.usage))
  }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
  async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, AiServiceError> {
    let (text, _usage) = self.complete(system_prompt, prompt).await?;
    Ok(text)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  fn config_for(server: &mockito::Server, api_key: Option<&str>) -> AiServiceConfig {
    AiServiceConfig {
      api_key: api_key.map(str::to_string),
      base_url: Url::parse(&server.url()).unwrap(),
      timeout: Duration::from_secs(5),
      ..AiServiceConfig::default()
    }
  }

  #[tokio::test]
  async fn test_missing_api_key() {
    let server = mockito::Server::new_async().await;
    let result = ClaudeClient::new(&config_for(&server, None));
    assert!(matches!(result, Err(AiServiceError::MissingApiKey)));
  }

  #[tokio::test]
  async fn test_generate_returns_first_text_block() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/v1/messages")
      .match_header("x-api-key", "sk-test")
      .match_header("anthropic-version", API_VERSION)
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        r#"{"content": [{"type": "text", "text": "{\"weeklyMeals\": {}}"}],
            "model": "test", "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}}"#,
      )
      .create_async()
      .await;

    let client = ClaudeClient::new(&config_for(&server, Some("sk-test"))).unwrap();
    let text = client.generate("system", "make a plan").await.unwrap();

    assert_eq!(text, r#"{"weeklyMeals": {}}"#);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_api_error_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/v1/messages")
      .with_status(401)
      .with_body(r#"{"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}"#)
      .create_async()
      .await;

    let client = ClaudeClient::new(&config_for(&server, Some("bad"))).unwrap();
    let err = client.generate("system", "prompt").await.unwrap_err();

    match err {
      AiServiceError::Api(message) => assert_eq!(message, "invalid x-api-key"),
      other => panic!("expected Api error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_response_without_text_block() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/v1/messages")
      .with_status(200)
      .with_body(r#"{"content": [], "stop_reason": "end_turn"}"#)
      .create_async()
      .await;

    let client = ClaudeClient::new(&config_for(&server, Some("sk-test"))).unwrap();
    let err = client.generate("system", "prompt").await.unwrap_err();
    assert!(matches!(err, AiServiceError::InvalidResponse(_)));
  }
}
