//! Application package — the per-job work product moving through the
//! orchestrator's state machine.

use serde::{Deserialize, Serialize};

use crate::errors::ErrorTag;
use crate::models::job::JobListing;

/// Orchestration state for one job. Transitions are monotonically forward;
/// `Failed` is an absorbing state reachable from any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageStatus {
    Pending,
    Enriching,
    Generating,
    Scoring,
    Done,
    Failed,
}

impl PackageStatus {
    fn rank(self) -> u8 {
        match self {
            PackageStatus::Pending => 0,
            PackageStatus::Enriching => 1,
            PackageStatus::Generating => 2,
            PackageStatus::Scoring => 3,
            PackageStatus::Done => 4,
            PackageStatus::Failed => 5,
        }
    }
}

/// Failure details carried by a `Failed` package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageError {
    pub kind: ErrorTag,
    pub message: String,
}

/// Everything one worker produces for one selected listing.
///
/// Owned exclusively by its worker task for its lifetime. Partial results
/// survive failure: a package that generated a resume but no cover letter
/// keeps the resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationPackage {
    pub job: JobListing,
    /// Result of the enrichment stage; may equal `job.description`.
    pub enriched_description: String,
    pub resume_text: Option<String>,
    pub cover_letter_text: Option<String>,
    /// Recomputed against the generated resume text once generation
    /// succeeds; falls back to the listing score otherwise.
    pub match_score: Option<f64>,
    pub status: PackageStatus,
    /// Present iff `status == Failed`.
    pub error: Option<PackageError>,
}

impl ApplicationPackage {
    pub fn new(job: JobListing) -> Self {
        let enriched_description = job.description.clone();
        Self {
            job,
            enriched_description,
            resume_text: None,
            cover_letter_text: None,
            match_score: None,
            status: PackageStatus::Pending,
            error: None,
        }
    }

    /// Moves the package forward. Backward transitions are a logic error;
    /// the only way to revisit an earlier stage is a fresh package.
    pub fn advance(&mut self, next: PackageStatus) {
        debug_assert!(
            next.rank() > self.status.rank(),
            "package state must move forward: {:?} -> {:?}",
            self.status,
            next
        );
        self.status = next;
    }

    /// Enters the absorbing `Failed` state, keeping any partial results.
    pub fn fail(&mut self, kind: ErrorTag, message: impl Into<String>) {
        self.status = PackageStatus::Failed;
        self.error = Some(PackageError {
            kind,
            message: message.into(),
        });
    }

    /// Package for a job whose orchestration was cut off by the run deadline.
    pub fn timed_out(job: JobListing) -> Self {
        let mut package = Self::new(job);
        package.fail(ErrorTag::Timeout, "run deadline expired before completion");
        package
    }

    /// True when at least one generation artifact exists.
    pub fn has_artifacts(&self) -> bool {
        self.resume_text.is_some() || self.cover_letter_text.is_some()
    }
}
