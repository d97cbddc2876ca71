//! OpenAI provider — paid backend, last in the default priority order and
//! only constructed when explicitly enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::providers::{classify_http_failure, FailureKind, GenerationError, GenerationProvider};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 6000;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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
    #[serde(default)]
    content: String,
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, model: Option<String>, timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn preflight(&self) -> Result<(), GenerationError> {
        match &self.api_key {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(GenerationError::new(
                FailureKind::Permanent,
                "OPENAI_API_KEY is not set",
            )),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            GenerationError::new(FailureKind::Permanent, "OPENAI_API_KEY is not set")
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::new(FailureKind::Transient, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let kind = classify_http_failure(status.as_u16(), &body);
            return Err(GenerationError::new(
                kind,
                format!("openai returned {status}: {body}"),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::new(FailureKind::Transient, e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                GenerationError::new(FailureKind::Transient, "openai returned empty content")
            })
    }
}
