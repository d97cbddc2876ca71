//! Candidate profile — the résumé-side input, immutable for a pipeline run.

use std::fs;
use std::path::Path;

use crate::errors::PipelineError;

/// Résumé text plus the role-family keywords used for title boosts.
/// Loaded once at startup and shared read-only with every worker.
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub name: String,
    pub resume_text: String,
    /// Role-family terms (e.g. "platform", "machine learning") whose presence
    /// in a job title earns a small additive score boost.
    pub title_keywords: Vec<String>,
}

impl CandidateProfile {
    pub fn new(
        name: impl Into<String>,
        resume_text: impl Into<String>,
        title_keywords: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resume_text: resume_text.into(),
            title_keywords,
        }
    }

    /// Reads the résumé from disk. The candidate name defaults to the first
    /// non-empty line when not configured elsewhere.
    pub fn load(path: &Path, title_keywords: &[String]) -> Result<Self, PipelineError> {
        let resume_text = fs::read_to_string(path).map_err(|e| {
            PipelineError::Profile(format!("cannot read resume at {}: {e}", path.display()))
        })?;

        if resume_text.trim().is_empty() {
            return Err(PipelineError::Profile(format!(
                "resume at {} is empty",
                path.display()
            )));
        }

        let name = resume_text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("Candidate")
            .to_string();

        Ok(Self::new(name, resume_text, title_keywords.to_vec()))
    }
}
