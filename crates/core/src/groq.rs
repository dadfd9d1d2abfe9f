//! Chat-completion requests for Groq's OpenAI-compatible API

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ErrorContext, Provider};

pub const API_ROOT: &str = "https://api.groq.com/openai/v1";

fn errors() -> ErrorContext {
    ErrorContext::new(Provider::Groq)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Model parameters. Used both for configured defaults and per-call overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sampling {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl Sampling {
    /// Values of `overrides` win; missing ones fall back to `self`.
    pub fn merge(&self, overrides: &Sampling) -> Sampling {
        Sampling {
            model: overrides.model.clone().or_else(|| self.model.clone()),
            temperature: overrides.temperature.or(self.temperature),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Validate the messages and build the request body.
///
/// The conversation must contain at least one `system` and one `user` message.
pub fn build_chat_request(
    messages: Vec<Message>,
    defaults: &Sampling,
    overrides: &Sampling,
) -> Result<ChatCompletionRequest, ApiError> {
    let sampling = defaults.merge(overrides);
    let model = sampling
        .model
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            errors().precondition("Please provide a model-ID (https://console.groq.com/docs/models)")
        })?;

    let has_role = |role: &str| messages.iter().any(|m| m.role == role);
    if !has_role("system") || !has_role("user") {
        return Err(errors().precondition(
            "Please provide at least one message with role \"system\" and one with role \"user\"",
        ));
    }

    Ok(ChatCompletionRequest {
        model,
        messages,
        temperature: sampling.temperature,
        max_tokens: sampling.max_tokens,
    })
}

/// Text of the first choice of a chat completion response, if any.
pub fn first_choice_text(response: &serde_json::Value) -> Option<&str> {
    response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}
