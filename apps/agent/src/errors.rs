#![allow(dead_code)]

//! Pipeline-level error type and the error-kind tags surfaced in run reports.
//!
//! Per-concern errors (`DiscoveryError`, `GenerationError`) live beside the
//! code that produces them; everything that must cross a module boundary or
//! reach the report converges here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::discovery::page::DiscoveryError;
use crate::providers::GenerationError;

/// Errors that abort the run. Everything else degrades to a per-source or
/// per-job failure recorded in the report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("no generation provider passed its startup check")]
    NoProviderConfigured,

    #[error("candidate profile error: {0}")]
    Profile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Error-kind tag attached to failed jobs and sources in the run report.
/// Mirrors the failure taxonomy: recoverable discovery failures, the
/// provider failure classes, terminal per-job conditions, and run-level
/// timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorTag {
    Discovery,
    RateLimited,
    QuotaExhausted,
    Transient,
    Permanent,
    NoProviderAvailable,
    Timeout,
    Validation,
}

impl From<&DiscoveryError> for ErrorTag {
    fn from(_: &DiscoveryError) -> Self {
        ErrorTag::Discovery
    }
}

impl From<&GenerationError> for ErrorTag {
    fn from(err: &GenerationError) -> Self {
        use crate::providers::FailureKind;
        match err.kind {
            FailureKind::RateLimited => ErrorTag::RateLimited,
            FailureKind::QuotaExhausted => ErrorTag::QuotaExhausted,
            FailureKind::Transient => ErrorTag::Transient,
            FailureKind::Permanent => ErrorTag::Permanent,
        }
    }
}
