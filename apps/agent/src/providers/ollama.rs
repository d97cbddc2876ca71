//! Ollama provider — free local backend, second in the default priority
//! order. Unlimited but only reachable when the daemon is running.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::providers::{classify_http_failure, FailureKind, GenerationError, GenerationProvider};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3:8b";

/// Short timeout for the reachability probe; the daemon either answers
/// instantly or isn't there.
const PREFLIGHT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(
        base_url: Option<String>,
        model: Option<String>,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn preflight(&self) -> Result<(), GenerationError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(PREFLIGHT_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                GenerationError::new(
                    FailureKind::Permanent,
                    format!("ollama not reachable at {}: {e}", self.base_url),
                )
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(GenerationError::new(
                FailureKind::Permanent,
                format!("ollama probe returned {}", response.status()),
            ))
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
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
                format!("ollama returned {status}: {body}"),
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::new(FailureKind::Transient, e.to_string()))?;

        if parsed.response.is_empty() {
            return Err(GenerationError::new(
                FailureKind::Transient,
                "ollama returned empty content",
            ));
        }
        Ok(parsed.response)
    }
}
