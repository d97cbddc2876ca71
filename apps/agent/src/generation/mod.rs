// Generation engine: per-job orchestration of enrichment, artifact
// generation, and match scoring. All LLM calls go through the provider
// manager — no direct backend calls here.

pub mod enrich;
pub mod prompts;

use tracing::{info, warn};

use crate::discovery::page::PageProvider;
use crate::errors::ErrorTag;
use crate::generation::enrich::enrich_description;
use crate::models::job::JobListing;
use crate::models::package::{ApplicationPackage, PackageStatus};
use crate::profile::CandidateProfile;
use crate::providers::manager::ProviderManager;
use crate::scoring::token_set_ratio;

/// Per-job orchestrator driving `Pending → Enriching → Generating →
/// Scoring → Done`, with `Failed` absorbing any step.
///
/// Enrichment always completes before generation starts; the two
/// generation calls (resume, cover letter) run concurrently with each
/// other and both settle before the job moves on.
pub struct Orchestrator<'a> {
    providers: &'a ProviderManager,
    pages: &'a dyn PageProvider,
    profile: &'a CandidateProfile,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        providers: &'a ProviderManager,
        pages: &'a dyn PageProvider,
        profile: &'a CandidateProfile,
    ) -> Self {
        Self {
            providers,
            pages,
            profile,
        }
    }

    /// Runs one job to completion. Never panics or errors out: every
    /// failure path lands in the returned package's status and error tag.
    pub async fn process(&self, job: JobListing) -> ApplicationPackage {
        let mut package = ApplicationPackage::new(job);
        info!(
            "Processing {} - {} (score {:.1})",
            package.job.company,
            package.job.title,
            package.job.score()
        );

        // Enriching: best-effort, soft failures only.
        package.advance(PackageStatus::Enriching);
        package.enriched_description =
            enrich_description(&package.job, self.pages, self.providers).await;

        // Generating: the two calls are unordered relative to each other,
        // but both must settle before the job proceeds.
        package.advance(PackageStatus::Generating);
        let resume_prompt =
            prompts::build_resume_prompt(self.profile, &package.job, &package.enriched_description);
        let cover_prompt = prompts::build_cover_letter_prompt(
            self.profile,
            &package.job,
            &package.enriched_description,
        );

        let (resume, cover_letter) = tokio::join!(
            self.providers.call(&resume_prompt),
            self.providers.call(&cover_prompt)
        );

        match (resume, cover_letter) {
            (Err(resume_err), Err(cover_err)) => {
                package.fail(
                    ErrorTag::NoProviderAvailable,
                    format!("resume: {resume_err}; cover letter: {cover_err}"),
                );
                return package;
            }
            (resume, cover_letter) => {
                if let Err(e) = &resume {
                    warn!("Resume generation failed for {}: {e}", package.job.id);
                }
                if let Err(e) = &cover_letter {
                    warn!("Cover letter generation failed for {}: {e}", package.job.id);
                }
                package.resume_text = resume.ok();
                package.cover_letter_text = cover_letter.ok();
            }
        }

        // Scoring: reporting-only; absence of a resume falls back to the
        // listing-level score.
        package.advance(PackageStatus::Scoring);
        let match_score = match &package.resume_text {
            Some(resume_text) => recompute_match_score(resume_text, &package),
            None => package.job.score(),
        };
        package.match_score = Some(match_score);

        package.advance(PackageStatus::Done);
        info!(
            "Done: {} - {} (match {:.1})",
            package.job.company,
            package.job.title,
            package.match_score.unwrap_or_default()
        );
        package
    }
}

/// Match score of the generated resume against the enriched posting,
/// distinct from the listing-level discovery score.
fn recompute_match_score(resume_text: &str, package: &ApplicationPackage) -> f64 {
    let posting = format!(
        "{}\n{}\n{}",
        package.job.title, package.job.company, package.enriched_description
    );
    token_set_ratio(resume_text, &posting)
}
