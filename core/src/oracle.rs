//! External text oracle (hosted LLM).
//!
//! Two call shapes: a one-shot prompt (priority classification) and a
//! chat turn with a system instruction and prior history (assistant).
//! Every call is bounded by the configured timeout. Callers own the
//! fallback; this module only reports what went wrong.

use crate::config::OracleConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One prior message in a conversation, in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Model, text: text.into() }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle is disabled or has no credentials")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Oracle answered with status {0}")]
    Status(u16),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Malformed oracle response: {0}")]
    Malformed(String),
}

pub trait Oracle {
    fn generate(&self, prompt: &str) -> Result<String, OracleError>;

    fn converse(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, OracleError>;
}

/// Stand-in when no oracle is configured. Every call fails, so every
/// caller takes its fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

impl Oracle for OfflineOracle {
    fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }

    fn converse(&self, _: &str, _: &[ChatTurn], _: &str) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }
}

// ── Gemini wire format ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<ChatRole>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl<'a> Content<'a> {
    fn text(role: Option<ChatRole>, text: &'a str) -> Self {
        Self { role, parts: vec![Part { text }] }
    }
}

/// Hosted Gemini model over blocking HTTP.
pub struct GeminiClient {
    config: OracleConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    /// Build a client. The API key is read from the env var named in
    /// `config.api_key_env`; without it the oracle is `Disabled`.
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        if !config.enabled {
            return Err(OracleError::Disabled);
        }
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(OracleError::Disabled)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Http(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, api_key, client })
    }

    fn call(&self, request: &GenerateRequest<'_>) -> Result<String, OracleError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.config.timeout_secs)
                } else {
                    OracleError::Http(format!("Request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()));
        }

        let body: GenerateResponse = response
            .json()
            .map_err(|e| OracleError::Malformed(format!("Failed to parse response: {e}")))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .ok_or_else(|| OracleError::Malformed("no candidates".to_string()))?;
        log::debug!("oracle {} replied with {} chars", self.config.model, text.len());
        Ok(text)
    }
}

impl Oracle for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        self.call(&GenerateRequest {
            system_instruction: None,
            contents: vec![Content::text(Some(ChatRole::User), prompt)],
        })
    }

    fn converse(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, OracleError> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|turn| Content::text(Some(turn.role), &turn.text))
            .collect();
        contents.push(Content::text(Some(ChatRole::User), message));
        self.call(&GenerateRequest {
            system_instruction: Some(Content::text(None, system_instruction)),
            contents,
        })
    }
}

/// The configured oracle, or `OfflineOracle` when it cannot be built.
pub fn oracle_from_config(config: &OracleConfig) -> Box<dyn Oracle> {
    match GeminiClient::new(config.clone()) {
        Ok(client) => {
            log::info!("oracle: {} at {}", config.model, config.endpoint);
            Box::new(client)
        }
        Err(e) => {
            log::warn!("oracle unavailable ({e}); keyword fallback and canned replies only");
            Box::new(OfflineOracle)
        }
    }
}
