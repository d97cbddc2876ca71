//! Worker pool — bounded-concurrency job orchestration under one run
//! deadline.
//!
//! Each job runs in its own task behind a semaphore permit; a failure or
//! panic in one job never touches its siblings. The deadline cuts off
//! queued and in-flight work cooperatively (dropping the orchestration
//! future cancels its provider calls and page fetches), and every job not
//! done by then is reported as `Failed(Timeout)`. Results come back in
//! pre-dispatch order regardless of completion order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info};

use crate::errors::ErrorTag;
use crate::generation::Orchestrator;
use crate::models::job::JobListing;
use crate::models::package::ApplicationPackage;
use crate::pipeline::PipelineContext;

pub struct WorkerPool {
    worker_count: usize,
    run_deadline: Duration,
}

impl WorkerPool {
    pub fn new(worker_count: usize, run_deadline: Duration) -> Self {
        Self {
            worker_count: worker_count.max(1),
            run_deadline,
        }
    }

    /// Fans the selected jobs out to orchestrators, at most `worker_count`
    /// in flight at once. Returns one package per input job, in input order.
    pub async fn run(
        &self,
        jobs: Vec<JobListing>,
        ctx: Arc<PipelineContext>,
    ) -> Vec<ApplicationPackage> {
        if jobs.is_empty() {
            return Vec::new();
        }
        info!(
            "Dispatching {} jobs across {} workers (deadline {:?})",
            jobs.len(),
            self.worker_count,
            self.run_deadline
        );

        let deadline = Instant::now() + self.run_deadline;
        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let mut tasks: JoinSet<(usize, ApplicationPackage)> = JoinSet::new();

        let job_snapshots: Vec<JobListing> = jobs.clone();

        for (index, job) in jobs.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let ctx = Arc::clone(&ctx);
            let job_for_timeout = job.clone();

            tasks.spawn(async move {
                let work = async {
                    // Time spent waiting for a permit counts against the
                    // deadline too; a saturated pool cannot defer it.
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("worker semaphore never closed");
                    let orchestrator =
                        Orchestrator::new(&ctx.providers, ctx.pages.as_ref(), &ctx.profile);
                    orchestrator.process(job).await
                };

                match tokio::time::timeout_at(deadline, work).await {
                    Ok(package) => (index, package),
                    Err(_) => (index, ApplicationPackage::timed_out(job_for_timeout)),
                }
            });
        }

        let mut slots: Vec<Option<ApplicationPackage>> =
            job_snapshots.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, package)) => slots[index] = Some(package),
                Err(e) => error!("Worker task aborted: {e}"),
            }
        }

        // A task that panicked still owes the report a line for its job.
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let mut package = ApplicationPackage::new(job_snapshots[index].clone());
                    package.fail(ErrorTag::Transient, "worker task aborted");
                    package
                })
            })
            .collect()
    }
}
