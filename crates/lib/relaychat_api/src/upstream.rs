//! Outbound client for the third-party chat completion API.
//!
//! One request per relay call: a fixed system instruction plus the user's raw
//! text. No retries.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;

pub const DEFAULT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const SYSTEM_PROMPT: &str =
    "You are an expert full-stack web developer. Answer should be well formatted";

/// Failures of the upstream completion call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The API answered with a non-success status.
    #[error("Upstream returned status {status}: {body}")]
    Status {
        status: u16,
        body: serde_json::Value,
    },

    /// No HTTP response was received.
    #[error("{0}")]
    Transport(String),

    /// A success status with a body that is not a usable completion.
    #[error("Malformed upstream reply: {0}")]
    MalformedReply(String),
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [PromptMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client bound to one completions endpoint and model.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: Client,
    url: String,
    model: String,
    system_prompt: String,
}

impl CompletionClient {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.completions_url, &config.model, &config.system_prompt)
    }

    /// Requests a completion for `message` and returns the first choice's text.
    pub async fn complete(&self, api_key: &str, message: &str) -> Result<String, UpstreamError> {
        let resp = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&build_request(&self.model, &self.system_prompt, message))
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        debug!(%status, body = %body, "completion API raw reply");

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: error_payload(status.as_u16(), &body),
            });
        }

        parse_reply(&body)
    }
}

fn build_request<'a>(model: &'a str, system_prompt: &'a str, message: &'a str) -> CompletionRequest<'a> {
    CompletionRequest {
        model,
        messages: [
            PromptMessage {
                role: "system",
                content: system_prompt,
            },
            PromptMessage {
                role: "user",
                content: message,
            },
        ],
    }
}

/// Upstream error body as JSON when it parses, otherwise as a string.
///
/// An empty body is replaced by a status message.
fn error_payload(status: u16, body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::String(format!("Request failed with status code {status}"));
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}

fn parse_reply(body: &str) -> Result<String, UpstreamError> {
    let reply: CompletionReply =
        serde_json::from_str(body).map_err(|e| UpstreamError::MalformedReply(e.to_string()))?;

    reply
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::MalformedReply("reply has no choices".into()))?
        .message
        .content
        .ok_or_else(|| UpstreamError::MalformedReply("first choice has no content".into()))
}
