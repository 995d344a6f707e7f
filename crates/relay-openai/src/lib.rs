//! OpenAI-compatible reply generator.
//!
//! Works with OpenAI and any API exposing `/chat/completions` in the same format.

use std::time::Duration;

use async_trait::async_trait;
use relay_core::{GeneratedReply, RelayError, ReplyGenerator};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_TOKENS: u32 = 200;
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Please keep your responses under 480 characters for SMS purposes.";

/// Connection settings for the completion provider.
#[derive(Clone)]
pub struct CompletionSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Chat-completion client that produces SMS replies.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(settings: CompletionSettings) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| RelayError::Internal(format!("completion client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.base_url,
            api_key: settings.api_key,
            model: settings.model,
            max_tokens: settings.max_tokens,
        })
    }

    fn request<'a>(&'a self, text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: Role::System,
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: Role::User,
                    content: text,
                },
            ],
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum Role {
    System,
    User,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
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

/// Pulls the first choice's text out of a completion payload.
fn reply_text(raw: &str) -> Option<String> {
    let parsed: ChatResponse = serde_json::from_str(raw).ok()?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.is_empty())
}

#[async_trait]
impl ReplyGenerator for OpenAiGenerator {
    async fn generate(&self, text: &str) -> Result<GeneratedReply, RelayError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request(text))
            .send()
            .await
            .map_err(|e| RelayError::UpstreamGeneration(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(RelayError::UpstreamGeneration(format!(
                "completion provider returned HTTP {}",
                status
            )));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| RelayError::UpstreamGeneration(e.without_url().to_string()))?;

        match reply_text(&raw) {
            Some(content) => {
                debug!(chars = content.chars().count(), "reply generated");
                Ok(GeneratedReply::new(content))
            }
            None => {
                warn!("completion payload had no usable content, using fallback reply");
                Ok(GeneratedReply::fallback())
            }
        }
    }
}
