//! Gemini provider — free-tier cloud backend, first in the default
//! priority order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::providers::{classify_http_failure, FailureKind, GenerationError, GenerationProvider};

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MAX_OUTPUT_TOKENS: u32 = 6000;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let joined: String = self
            .candidates
            .first()?
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiProvider {
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
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn preflight(&self) -> Result<(), GenerationError> {
        match &self.api_key {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(GenerationError::new(
                FailureKind::Permanent,
                "GEMINI_API_KEY is not set",
            )),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            GenerationError::new(FailureKind::Permanent, "GEMINI_API_KEY is not set")
        })?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!("{API_BASE}/{}:generateContent?key={key}", self.model);
        let response = self
            .client
            .post(&url)
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
                format!("gemini returned {status}: {body}"),
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::new(FailureKind::Transient, e.to_string()))?;

        debug!("Gemini call succeeded ({} candidates)", parsed.candidates.len());

        parsed.text().ok_or_else(|| {
            GenerationError::new(FailureKind::Transient, "gemini returned empty content")
        })
    }
}
