//! Generation providers — the backends that turn prompts into text.
//!
//! Every LLM call in the pipeline goes through the `ProviderManager`; no
//! module calls a backend directly. Providers are prompt-agnostic: the
//! manager and the backends see opaque prompt strings only.

pub mod gemini;
pub mod manager;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Failure classes a provider call can produce. The first three are
/// rate-limit-class (retryable with backoff); `Permanent` disables the
/// provider for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum FailureKind {
    RateLimited,
    QuotaExhausted,
    Transient,
    Permanent,
}

impl FailureKind {
    pub fn is_rate_limit_class(self) -> bool {
        !matches!(self, FailureKind::Permanent)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct GenerationError {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A single generation backend. Implementations map their transport and API
/// errors onto `FailureKind` so the manager can decide retry vs fall-through.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Reachability/credential check, run once at startup. A failing
    /// provider is excluded from the priority list for the run.
    async fn preflight(&self) -> Result<(), GenerationError>;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Maps an HTTP status plus response body onto a failure class. Shared by
/// the HTTP-backed providers.
pub fn classify_http_failure(status: u16, body: &str) -> FailureKind {
    let body_lower = body.to_lowercase();
    let mentions_quota = body_lower.contains("quota")
        || body_lower.contains("resource_exhausted")
        || body_lower.contains("insufficient_quota");

    match status {
        429 => {
            if mentions_quota {
                FailureKind::QuotaExhausted
            } else {
                FailureKind::RateLimited
            }
        }
        400 | 401 | 403 | 404 => FailureKind::Permanent,
        500..=599 => FailureKind::Transient,
        _ if mentions_quota => FailureKind::QuotaExhausted,
        _ => FailureKind::Transient,
    }
}
