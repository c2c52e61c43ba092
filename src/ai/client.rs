//! Client for the generative-AI `generateContent` endpoint.
//!
//! Every AI feature goes through the `LlmClient` trait so handlers can be
//! exercised against a fake. The HTTP client makes exactly one call per request.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AiConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// One turn of a conversation, in the wire shape the endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Earlier turns, oldest first. Empty for single-shot prompts.
    pub history: Vec<ChatTurn>,
    pub prompt: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn single(prompt: String, temperature: f32) -> Self {
        Self {
            history: Vec::new(),
            prompt,
            temperature,
        }
    }
}

/// What came back: the generated text, or the reason the prompt was blocked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: Option<String>,
    pub block_reason: Option<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, req: GenerationRequest) -> Result<Generation, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<ChatTurn>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    fn into_generation(self) -> Generation {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .filter(|t| !t.is_empty());
        Generation {
            text,
            block_reason: self.prompt_feedback.and_then(|f| f.block_reason),
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(cfg: &AiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                cfg.base_url.trim_end_matches('/'),
                cfg.model
            ),
            api_key: cfg.api_key.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, req: GenerationRequest) -> Result<Generation, LlmError> {
        let mut contents = req.history;
        contents.push(ChatTurn::user(req.prompt));
        let body = GenerateContentBody {
            contents,
            generation_config: GenerationConfig {
                temperature: req.temperature,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            warn!(status = status.as_u16(), "generateContent failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let raw = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&raw)?;
        let generation = parsed.into_generation();
        debug!(
            chars = generation.text.as_deref().map(str::len).unwrap_or(0),
            blocked = generation.block_reason.is_some(),
            "generateContent succeeded"
        );
        Ok(generation)
    }
}

#[cfg(test)]
mod client_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_parts_of_first_candidate() {
        let raw = json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "## Hi"}, {"text": " there"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let g = parsed.into_generation();
        assert_eq!(g.text.as_deref(), Some("## Hi there"));
        assert!(g.block_reason.is_none());
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let g = parsed.into_generation();
        assert!(g.text.is_none());
        assert_eq!(g.block_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn request_body_appends_prompt_after_history() {
        let body = GenerateContentBody {
            contents: vec![
                ChatTurn::user("hi"),
                ChatTurn {
                    role: ChatRole::Model,
                    parts: vec![Part { text: "hello".into() }],
                },
                ChatTurn::user("next"),
            ],
            generation_config: GenerationConfig { temperature: 0.7 },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["contents"][1]["role"], "model");
        assert_eq!(v["contents"][2]["parts"][0]["text"], "next");
        assert!((v["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn history_turn_rejects_unknown_role() {
        let bad = json!({"role": "system", "parts": [{"text": "x"}]});
        assert!(serde_json::from_value::<ChatTurn>(bad).is_err());
    }
}
