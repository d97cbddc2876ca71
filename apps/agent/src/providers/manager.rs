//! Provider manager — single source of truth for "which backend do I call
//! right now".
//!
//! Holds the ordered priority list and per-provider health state. Rate-limit
//! class failures retry the same provider on an exponential schedule, then
//! push it into a backoff window and fall through to the next provider.
//! Permanent failures disable a provider for the rest of the run. State is
//! synchronized per provider, so one provider's backoff never blocks
//! another's calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::PipelineError;
use crate::providers::{FailureKind, GenerationError, GenerationProvider};

/// Upper bound on the random jitter added to each retry sleep.
const JITTER_MAX_MS: u64 = 250;

/// Cap on the backoff-window doubling exponent.
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Same-provider retry schedule for rate-limit-class failures:
/// sleeps of `base * 2^(attempt-1)`, i.e. 2 s, 4 s, 8 s by default.
#[derive(Debug, Clone, Copy)]
pub struct RetrySchedule {
    pub max_retries: u32,
    pub base: Duration,
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base: Duration::from_secs(2),
        }
    }
}

/// Per-provider health, owned by the manager and mutated nowhere else.
#[derive(Debug, Clone)]
pub struct ProviderState {
    pub available: bool,
    pub consecutive_failures: u32,
    pub next_eligible_at: Option<Instant>,
}

impl ProviderState {
    fn new() -> Self {
        Self {
            available: true,
            consecutive_failures: 0,
            next_eligible_at: None,
        }
    }
}

/// Terminal outcome of a `call` once every provider is disabled, backing
/// off, or exhausted. Terminal for the calling job's step, not for the run.
#[derive(Debug, Clone, Error)]
#[error("no generation provider available: {last_failure}")]
pub struct NoProviderAvailable {
    pub last_failure: String,
}

struct ProviderSlot {
    provider: Arc<dyn GenerationProvider>,
    state: Mutex<ProviderState>,
}

impl ProviderSlot {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().expect("provider state lock poisoned")
    }

    fn is_eligible(&self) -> bool {
        let state = self.lock();
        state.available
            && state
                .next_eligible_at
                .map_or(true, |at| Instant::now() >= at)
    }

    fn record_success(&self) {
        let mut state = self.lock();
        state.consecutive_failures = 0;
        state.next_eligible_at = None;
    }

    /// Pushes the provider into a backoff window. Windows double with each
    /// consecutive exhausted round, so `next_eligible_at` moves strictly
    /// further out while the provider keeps failing.
    fn enter_backoff(&self, base_window: Duration) -> Duration {
        let mut state = self.lock();
        state.consecutive_failures += 1;
        let exponent = (state.consecutive_failures - 1).min(MAX_BACKOFF_EXPONENT);
        let window = base_window * 2u32.pow(exponent);
        state.next_eligible_at = Some(Instant::now() + window);
        window
    }

    fn disable(&self) {
        let mut state = self.lock();
        state.available = false;
    }
}

pub struct ProviderManager {
    slots: Vec<ProviderSlot>,
    schedule: RetrySchedule,
    backoff_window: Duration,
}

impl ProviderManager {
    /// Builds a manager from an ordered priority list. An empty list is a
    /// startup error: the run cannot generate anything without providers.
    pub fn new(providers: Vec<Arc<dyn GenerationProvider>>) -> Result<Self, PipelineError> {
        Self::with_schedule(providers, RetrySchedule::default(), Duration::from_secs(30))
    }

    pub fn with_schedule(
        providers: Vec<Arc<dyn GenerationProvider>>,
        schedule: RetrySchedule,
        backoff_window: Duration,
    ) -> Result<Self, PipelineError> {
        if providers.is_empty() {
            return Err(PipelineError::NoProviderConfigured);
        }
        Ok(Self {
            slots: providers
                .into_iter()
                .map(|provider| ProviderSlot {
                    provider,
                    state: Mutex::new(ProviderState::new()),
                })
                .collect(),
            schedule,
            backoff_window,
        })
    }

    /// Runs every provider's reachability/credential check once, disabling
    /// the ones that fail. Errors out if nothing survives.
    pub async fn preflight(&self) -> Result<usize, PipelineError> {
        let mut available = 0usize;
        for slot in &self.slots {
            match slot.provider.preflight().await {
                Ok(()) => {
                    info!("Provider {} passed preflight", slot.name());
                    available += 1;
                }
                Err(e) => {
                    warn!("Provider {} failed preflight, disabled for run: {}", slot.name(), e);
                    slot.disable();
                }
            }
        }
        if available == 0 {
            return Err(PipelineError::NoProviderConfigured);
        }
        Ok(available)
    }

    /// Executes one generation request with fallback. The contract is the
    /// same for every consumer; prompt semantics never reach this layer.
    pub async fn call(&self, prompt: &str) -> Result<String, NoProviderAvailable> {
        let mut last_failure = "provider priority list exhausted".to_string();

        for slot in &self.slots {
            if !slot.is_eligible() {
                debug!("Provider {} skipped (unavailable or backing off)", slot.name());
                continue;
            }

            match self.invoke_with_retry(slot, prompt).await {
                Ok(text) => {
                    slot.record_success();
                    return Ok(text);
                }
                Err(err) => {
                    last_failure = format!("{}: {}", slot.name(), err);
                    if err.kind == FailureKind::Permanent {
                        warn!("Provider {} failed permanently, disabled for run: {}", slot.name(), err);
                        slot.disable();
                    } else {
                        let window = slot.enter_backoff(self.backoff_window);
                        warn!(
                            "Provider {} exhausted retries ({}), backing off {:?}",
                            slot.name(),
                            err,
                            window
                        );
                    }
                }
            }
        }

        Err(NoProviderAvailable { last_failure })
    }

    /// Same-provider retry loop. Rate-limit-class failures sleep on the
    /// exponential schedule (plus jitter, so concurrent workers don't
    /// hammer a recovering backend in lockstep); permanent failures return
    /// immediately with no retry budget spent.
    async fn invoke_with_retry(
        &self,
        slot: &ProviderSlot,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let mut attempt = 0u32;
        loop {
            match slot.provider.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if !err.kind.is_rate_limit_class() || attempt >= self.schedule.max_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    let delay = self.schedule.base * 2u32.pow(attempt - 1);
                    let jitter =
                        Duration::from_millis(rand::thread_rng().gen_range(0..=JITTER_MAX_MS));
                    warn!(
                        "Provider {} retry {}/{} after {:?} ({})",
                        slot.name(),
                        attempt,
                        self.schedule.max_retries,
                        delay,
                        err
                    );
                    tokio::time::sleep(delay + jitter).await;
                }
            }
        }
    }

    /// Snapshot of per-provider state for logging and the run summary.
    pub fn states(&self) -> Vec<(String, ProviderState)> {
        self.slots
            .iter()
            .map(|slot| (slot.name().to_string(), slot.lock().clone()))
            .collect()
    }
}
