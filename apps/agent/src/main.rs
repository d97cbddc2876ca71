mod config;
mod discovery;
mod errors;
mod filters;
mod generation;
mod models;
mod pipeline;
mod profile;
mod providers;
mod render;
mod scoring;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, RunOptions};
use crate::discovery::page::HttpPageProvider;
use crate::pipeline::report;
use crate::pipeline::PipelineContext;
use crate::profile::CandidateProfile;
use crate::providers::gemini::GeminiProvider;
use crate::providers::manager::ProviderManager;
use crate::providers::ollama::OllamaProvider;
use crate::providers::openai::OpenAiProvider;
use crate::providers::GenerationProvider;
use crate::render::TextFileRenderer;

/// Timeout for a single generation call; retries and fallback live above
/// this in the provider manager.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment configuration first (secrets, log level).
    let config = Config::from_env();

    // Initialize structured logging.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job application agent v{}", env!("CARGO_PKG_VERSION"));

    // Run options; validation failures abort here, nothing later does.
    let options_path =
        std::env::var("AGENT_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let options = RunOptions::load(Path::new(&options_path))?;
    info!(
        "Run options loaded from {}: {} sites, min_score={}, workers={}",
        options_path,
        options.sites.len(),
        options.min_score,
        options.worker_count
    );

    // Candidate profile, immutable for the run.
    let profile = CandidateProfile::load(Path::new(&options.resume_path), &options.title_keywords)?;
    info!("Candidate profile loaded for {}", profile.name);

    // Provider manager from the configured priority order, preflighted once.
    let manager = ProviderManager::new(build_providers(&options.provider_priority, &config))?;
    let available = manager.preflight().await?;
    info!("{available} generation providers passed preflight");

    let pages = Arc::new(HttpPageProvider::new(options.page_fetch_timeout()));
    let renderer = TextFileRenderer::new(&options.output_dir);
    std::fs::create_dir_all(&options.output_dir)?;

    let ctx = Arc::new(PipelineContext {
        providers: manager,
        pages,
        profile,
    });

    let run_report = pipeline::run(&options, ctx, &renderer).await;

    report::log_summary(&run_report);
    report::write_report_json(
        &run_report,
        &Path::new(&options.output_dir).join("run_report.json"),
    );

    Ok(())
}

/// Instantiates providers in the configured priority order. Unknown names
/// were already rejected by validation.
fn build_providers(priority: &[String], config: &Config) -> Vec<Arc<dyn GenerationProvider>> {
    priority
        .iter()
        .filter_map(|name| match name.as_str() {
            "gemini" => Some(Arc::new(GeminiProvider::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
                GENERATION_TIMEOUT,
            )) as Arc<dyn GenerationProvider>),
            "ollama" => Some(Arc::new(OllamaProvider::new(
                config.ollama_base_url.clone(),
                config.ollama_model.clone(),
                GENERATION_TIMEOUT,
            )) as Arc<dyn GenerationProvider>),
            "openai" => Some(Arc::new(OpenAiProvider::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
                GENERATION_TIMEOUT,
            )) as Arc<dyn GenerationProvider>),
            other => {
                warn!("Ignoring unknown provider {other:?} in priority list");
                None
            }
        })
        .collect()
}
