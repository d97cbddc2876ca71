//! Run report assembly — the sole externally consumed output of the core.
//!
//! The assembler renders artifact files best-effort and produces an ordered
//! report listing every job that survived the filter chain, each with an
//! explicit status. Text artifacts stay canonical even when rendering fails.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::models::package::{ApplicationPackage, PackageError, PackageStatus};
use crate::render::{ArtifactKind, ArtifactMeta, DocumentRenderer};

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunCounts {
    pub discovered: usize,
    pub scored: usize,
    pub filtered: usize,
    pub generated: usize,
    pub failed: usize,
}

/// A discovery source that degraded to zero listings, attributed by its
/// source id so failures never vanish from the report.
#[derive(Debug, Clone, Serialize)]
pub struct SourceError {
    pub source: String,
    pub kind: crate::errors::ErrorTag,
    pub message: String,
}

/// One line of the run report. Partial successes stay visible: a package
/// with a resume but no cover letter reports exactly that.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub company: String,
    pub title: String,
    pub score: f64,
    pub match_score: Option<f64>,
    pub status: PackageStatus,
    pub resume_generated: bool,
    pub cover_letter_generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PackageError>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub counts: RunCounts,
    pub jobs: Vec<JobSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source_errors: Vec<SourceError>,
}

pub struct ArtifactAssembler<'a> {
    renderer: &'a dyn DocumentRenderer,
}

impl<'a> ArtifactAssembler<'a> {
    pub fn new(renderer: &'a dyn DocumentRenderer) -> Self {
        Self { renderer }
    }

    /// Collects finished packages (already in pre-dispatch order) into the
    /// final report, rendering artifact files along the way. `counts` comes
    /// in with the discovery-side numbers; generated/failed are filled here.
    pub async fn assemble(
        &self,
        packages: Vec<ApplicationPackage>,
        source_errors: Vec<SourceError>,
        mut counts: RunCounts,
        started_at: DateTime<Utc>,
        elapsed_secs: f64,
    ) -> RunReport {
        let mut jobs = Vec::with_capacity(packages.len());

        for package in packages {
            if package.has_artifacts() {
                counts.generated += 1;
            }
            if package.status == PackageStatus::Failed {
                counts.failed += 1;
            }

            let meta = ArtifactMeta {
                company: &package.job.company,
                title: &package.job.title,
            };
            let resume_path = self
                .render_artifact(package.resume_text.as_deref(), ArtifactKind::Resume, &meta)
                .await;
            let cover_letter_path = self
                .render_artifact(
                    package.cover_letter_text.as_deref(),
                    ArtifactKind::CoverLetter,
                    &meta,
                )
                .await;

            jobs.push(JobSummary {
                company: package.job.company.clone(),
                title: package.job.title.clone(),
                score: package.job.score(),
                match_score: package.match_score,
                status: package.status,
                resume_generated: package.resume_text.is_some(),
                cover_letter_generated: package.cover_letter_text.is_some(),
                resume_path,
                cover_letter_path,
                error: package.error.clone(),
            });
        }

        RunReport {
            started_at,
            elapsed_secs,
            counts,
            jobs,
            source_errors,
        }
    }

    async fn render_artifact(
        &self,
        text: Option<&str>,
        kind: ArtifactKind,
        meta: &ArtifactMeta<'_>,
    ) -> Option<PathBuf> {
        let text = text?;
        match self.renderer.render(text, kind, meta).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(
                    "Rendering {kind:?} for {} - {} failed (text kept in report): {e}",
                    meta.company, meta.title
                );
                None
            }
        }
    }
}

/// Persists the report as JSON. Best-effort: a write failure is logged and
/// the in-memory report remains the canonical output.
pub fn write_report_json(report: &RunReport, path: &Path) {
    let serialized = match serde_json::to_string_pretty(report) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not serialize run report: {e}");
            return;
        }
    };
    if let Err(e) = std::fs::write(path, serialized) {
        warn!("Could not write run report to {}: {e}", path.display());
    } else {
        info!("Run report written to {}", path.display());
    }
}

/// Logs the run summary block.
pub fn log_summary(report: &RunReport) {
    info!("Run complete in {:.1}s", report.elapsed_secs);
    info!(
        "  discovered={} scored={} filtered={} generated={} failed={}",
        report.counts.discovered,
        report.counts.scored,
        report.counts.filtered,
        report.counts.generated,
        report.counts.failed
    );
    for job in &report.jobs {
        info!(
            "  {} - {} (score {:.1}) status={:?} resume={} cover_letter={}",
            job.company,
            job.title,
            job.score,
            job.status,
            job.resume_generated,
            job.cover_letter_generated
        );
    }
    for source_error in &report.source_errors {
        warn!(
            "  source {} failed ({:?}): {}",
            source_error.source, source_error.kind, source_error.message
        );
    }
}
