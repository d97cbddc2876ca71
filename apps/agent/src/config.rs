//! Configuration: provider credentials from the environment, run options
//! from a JSON file. Validation failures are fatal at startup; nothing else
//! is.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::discovery::descriptor::SiteDescriptor;
use crate::errors::PipelineError;
use crate::filters::FilterSettings;

/// Provider names accepted in `provider_priority`.
pub const KNOWN_PROVIDERS: &[&str] = &["gemini", "ollama", "openai"];

/// Secrets and endpoints loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub ollama_base_url: Option<String>,
    pub ollama_model: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL"),
            ollama_base_url: optional_env("OLLAMA_BASE_URL"),
            ollama_model: optional_env("OLLAMA_MODEL"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: optional_env("OPENAI_MODEL"),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn default_min_score() -> f64 {
    50.0
}
fn default_true() -> bool {
    true
}
fn default_top_per_company_limit() -> usize {
    1
}
fn default_max_jobs() -> usize {
    10
}
fn default_worker_count() -> usize {
    5
}
fn default_run_deadline() -> u64 {
    1200
}
fn default_provider_priority() -> Vec<String> {
    KNOWN_PROVIDERS.iter().map(|s| s.to_string()).collect()
}
fn default_resume_path() -> String {
    "input/resume.txt".to_string()
}
fn default_output_dir() -> String {
    "output".to_string()
}
fn default_page_fetch_timeout() -> u64 {
    30
}
fn default_reveal_wait() -> u64 {
    3
}

/// Run options from the JSON config file. Every knob has a default, so a
/// minimal config only needs `sites`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunOptions {
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default)]
    pub target_locations: Vec<String>,
    #[serde(default = "default_true")]
    pub top_per_company: bool,
    #[serde(default = "default_top_per_company_limit")]
    pub top_per_company_limit: usize,
    #[serde(default = "default_max_jobs")]
    pub max_jobs_per_run: usize,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_run_deadline")]
    pub run_deadline_secs: u64,
    /// Ordered: free/local backends before paid ones.
    #[serde(default = "default_provider_priority")]
    pub provider_priority: Vec<String>,
    /// Role-family terms granting listing-score title boosts.
    #[serde(default)]
    pub title_keywords: Vec<String>,
    #[serde(default = "default_resume_path")]
    pub resume_path: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Per-fetch timeout; independent of and shorter than the run deadline.
    #[serde(default = "default_page_fetch_timeout")]
    pub page_fetch_timeout_secs: u64,
    #[serde(default = "default_reveal_wait")]
    pub reveal_wait_secs: u64,
    #[serde(default)]
    pub sites: Vec<SiteDescriptor>,
}

impl RunOptions {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path)?;
        let options: RunOptions = serde_json::from_str(&raw)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=100.0).contains(&self.min_score) {
            return Err(PipelineError::Validation(format!(
                "min_score must be within [0, 100], got {}",
                self.min_score
            )));
        }
        if self.worker_count == 0 {
            return Err(PipelineError::Validation(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.max_jobs_per_run == 0 {
            return Err(PipelineError::Validation(
                "max_jobs_per_run must be at least 1".to_string(),
            ));
        }
        if self.run_deadline_secs == 0 {
            return Err(PipelineError::Validation(
                "run_deadline_secs must be positive".to_string(),
            ));
        }
        if self.page_fetch_timeout_secs >= self.run_deadline_secs {
            return Err(PipelineError::Validation(format!(
                "page_fetch_timeout_secs ({}) must be shorter than run_deadline_secs ({})",
                self.page_fetch_timeout_secs, self.run_deadline_secs
            )));
        }
        if self.provider_priority.is_empty() {
            return Err(PipelineError::Validation(
                "provider_priority must name at least one provider".to_string(),
            ));
        }
        for name in &self.provider_priority {
            if !KNOWN_PROVIDERS.contains(&name.as_str()) {
                return Err(PipelineError::Validation(format!(
                    "unknown provider {name:?}; known providers: {KNOWN_PROVIDERS:?}"
                )));
            }
        }
        if self.sites.is_empty() {
            return Err(PipelineError::Validation(
                "sites must list at least one career page".to_string(),
            ));
        }
        Ok(())
    }

    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            min_score: self.min_score,
            target_locations: self.target_locations.clone(),
            top_per_company: self.top_per_company.then_some(self.top_per_company_limit),
            max_jobs: self.max_jobs_per_run,
        }
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }

    pub fn page_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.page_fetch_timeout_secs)
    }

    pub fn reveal_wait(&self) -> Duration {
        Duration::from_secs(self.reveal_wait_secs)
    }
}
