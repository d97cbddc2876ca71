//! Discovery — turns site descriptors into normalized job listings.
//!
//! Flow per source: open page session → click declared reveal triggers →
//! run the convergence-bounded reveal loop → extract fragments → normalize
//! and dedupe into `JobListing`s. A failing source yields a recoverable
//! `DiscoveryError`; the pipeline degrades it to zero listings.

pub mod descriptor;
pub mod page;

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::discovery::descriptor::SiteDescriptor;
use crate::discovery::page::{PageProvider, RawFragment};
use crate::models::job::JobListing;

/// Floor wait after a reveal click; async content needs time to land.
const MIN_REVEAL_WAIT: Duration = Duration::from_secs(3);

/// Wait between load-more steps in the reveal loop.
const REVEAL_STEP_WAIT: Duration = Duration::from_secs(2);

/// Consecutive unchanged fingerprints required before the reveal loop stops.
/// One unchanged read is not enough: a single no-op scroll can race content
/// that is still arriving.
const STABLE_READS: u32 = 2;

pub struct ListingExtractor<'a> {
    pages: &'a dyn PageProvider,
    reveal_wait: Duration,
}

impl<'a> ListingExtractor<'a> {
    pub fn new(pages: &'a dyn PageProvider) -> Self {
        Self {
            pages,
            reveal_wait: MIN_REVEAL_WAIT,
        }
    }

    /// Configures the post-click wait. Values below the floor are raised to it.
    pub fn with_reveal_wait(mut self, wait: Duration) -> Self {
        self.reveal_wait = wait.max(MIN_REVEAL_WAIT);
        self
    }

    /// Extracts deduplicated listings from one site.
    pub async fn extract(
        &self,
        descriptor: &SiteDescriptor,
    ) -> Result<Vec<JobListing>, page::DiscoveryError> {
        let mut session = self.pages.open(descriptor).await?;

        // Reveal triggers, in the order they are declared.
        for trigger in &descriptor.reveal_triggers {
            match session.trigger_reveal(trigger).await {
                Ok(true) => {
                    info!("Clicked reveal trigger {:?} on {}", trigger, descriptor.url);
                    tokio::time::sleep(self.reveal_wait).await;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Reveal trigger {:?} failed on {}: {}", trigger, descriptor.url, e);
                }
            }
        }

        // Convergence-bounded reveal loop: load more until the content
        // fingerprint is stable twice in a row or the step budget runs out.
        let mut last = session.fingerprint();
        let mut unchanged = 0u32;
        let mut steps = 0u32;
        while unchanged < STABLE_READS && steps < descriptor.max_reveal_steps {
            session.load_more().await?;
            tokio::time::sleep(REVEAL_STEP_WAIT).await;

            let current = session.fingerprint();
            if current == last {
                unchanged += 1;
            } else {
                unchanged = 0;
                last = current;
            }
            steps += 1;
        }
        debug!("Reveal loop for {} settled after {} steps", descriptor.url, steps);

        let fragments = session.fragments(descriptor)?;
        let listings = normalize_fragments(descriptor, fragments);
        info!(
            "Extracted {} listings from {} ({})",
            listings.len(),
            descriptor.company,
            descriptor.url
        );
        Ok(listings)
    }
}

/// Converts raw fragments into listings: drops untitled fragments, resolves
/// relative links, and dedupes on `(source, url)` with last-write-wins for
/// the mutable fields.
fn normalize_fragments(
    descriptor: &SiteDescriptor,
    fragments: Vec<RawFragment>,
) -> Vec<JobListing> {
    let source = descriptor.source();
    let base = descriptor
        .absolute_base
        .as_deref()
        .unwrap_or(&descriptor.url);
    let base_url = Url::parse(base).ok();

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut listings: Vec<JobListing> = Vec::new();

    for fragment in fragments {
        if fragment.title.trim().is_empty() {
            continue;
        }

        let url = resolve_link(&base_url, &fragment.href);
        let listing = JobListing::new(
            &source,
            &fragment.title,
            &fragment.location,
            &url,
            &descriptor.company,
            "",
        );

        match index.get(&listing.id) {
            // Repeated reveal passes re-emit the same posting; the latest
            // read wins for title/location.
            Some(&position) => listings[position] = listing,
            None => {
                index.insert(listing.id.clone(), listings.len());
                listings.push(listing);
            }
        }
    }

    listings
}

fn resolve_link(base: &Option<Url>, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::page::{DiscoveryError, PageSession};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn make_descriptor() -> SiteDescriptor {
        serde_json::from_str(
            r#"{"url": "https://acme.com/careers", "company": "Acme",
                "reveal_triggers": ["view all jobs"]}"#,
        )
        .unwrap()
    }

    /// Scripted session: fingerprints come from a queue, fragments are fixed.
    struct ScriptedSession {
        fingerprints: Vec<u64>,
        reads: usize,
        load_more_calls: Arc<AtomicU32>,
        trigger_calls: Arc<AtomicU32>,
        fragments: Vec<RawFragment>,
    }

    #[async_trait]
    impl PageSession for ScriptedSession {
        async fn trigger_reveal(&mut self, _text: &str) -> Result<bool, DiscoveryError> {
            self.trigger_calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        async fn load_more(&mut self) -> Result<(), DiscoveryError> {
            self.load_more_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn fingerprint(&self) -> u64 {
            let idx = self.reads.min(self.fingerprints.len() - 1);
            self.fingerprints[idx]
        }

        fn fragments(&self, _d: &SiteDescriptor) -> Result<Vec<RawFragment>, DiscoveryError> {
            Ok(self.fragments.clone())
        }
    }

    // fingerprint() is &self but the loop reads once per step; emulate the
    // advancing clock by bumping `reads` inside load_more instead.
    struct GrowingSession {
        heights: Vec<u64>,
        cursor: usize,
        load_more_calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl PageSession for GrowingSession {
        async fn trigger_reveal(&mut self, _text: &str) -> Result<bool, DiscoveryError> {
            Ok(false)
        }

        async fn load_more(&mut self) -> Result<(), DiscoveryError> {
            self.load_more_calls.fetch_add(1, Ordering::SeqCst);
            if self.cursor + 1 < self.heights.len() {
                self.cursor += 1;
            }
            Ok(())
        }

        fn fingerprint(&self) -> u64 {
            self.heights[self.cursor]
        }

        fn fragments(&self, _d: &SiteDescriptor) -> Result<Vec<RawFragment>, DiscoveryError> {
            Ok(vec![])
        }
    }

    struct FakeProvider {
        session_factory: Box<dyn Fn() -> Box<dyn PageSession> + Send + Sync>,
    }

    #[async_trait]
    impl PageProvider for FakeProvider {
        async fn open(
            &self,
            _descriptor: &SiteDescriptor,
        ) -> Result<Box<dyn PageSession>, DiscoveryError> {
            Ok((self.session_factory)())
        }

        async fn fetch_text(&self, _url: &str) -> Result<String, DiscoveryError> {
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_loop_stops_after_two_stable_reads() {
        let load_more_calls = Arc::new(AtomicU32::new(0));
        let calls = load_more_calls.clone();
        let provider = FakeProvider {
            session_factory: Box::new(move || {
                Box::new(GrowingSession {
                    // grows once, then stabilizes
                    heights: vec![100, 200, 200, 200, 200, 200],
                    cursor: 0,
                    load_more_calls: calls.clone(),
                })
            }),
        };

        let extractor = ListingExtractor::new(&provider);
        extractor.extract(&make_descriptor()).await.unwrap();

        // Steps: grow (reset), stable x2 -> 3 load_more calls, under the
        // max_reveal_steps budget of 5.
        assert_eq!(load_more_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_loop_bounded_by_max_steps() {
        let load_more_calls = Arc::new(AtomicU32::new(0));
        let calls = load_more_calls.clone();
        let provider = FakeProvider {
            session_factory: Box::new(move || {
                Box::new(GrowingSession {
                    // never stabilizes
                    heights: (0..20).map(|i| 100 + i).collect(),
                    cursor: 0,
                    load_more_calls: calls.clone(),
                })
            }),
        };

        let extractor = ListingExtractor::new(&provider);
        extractor.extract(&make_descriptor()).await.unwrap();

        assert_eq!(load_more_calls.load(Ordering::SeqCst), 5, "capped at max_reveal_steps");
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_dedupes_on_source_url_last_write_wins() {
        let trigger_calls = Arc::new(AtomicU32::new(0));
        let calls = trigger_calls.clone();
        let provider = FakeProvider {
            session_factory: Box::new(move || {
                Box::new(ScriptedSession {
                    fingerprints: vec![100],
                    reads: 0,
                    load_more_calls: Arc::new(AtomicU32::new(0)),
                    trigger_calls: calls.clone(),
                    fragments: vec![
                        RawFragment {
                            title: "Engineer".to_string(),
                            location: "Austin".to_string(),
                            href: "/jobs/1".to_string(),
                        },
                        RawFragment {
                            title: "Engineer (Updated)".to_string(),
                            location: "Austin, TX".to_string(),
                            href: "/jobs/1".to_string(),
                        },
                        RawFragment {
                            title: "".to_string(),
                            location: "Nowhere".to_string(),
                            href: "/jobs/2".to_string(),
                        },
                    ],
                })
            }),
        };

        let extractor = ListingExtractor::new(&provider);
        let listings = extractor.extract(&make_descriptor()).await.unwrap();

        assert_eq!(listings.len(), 1, "duplicate and untitled fragments dropped");
        assert_eq!(listings[0].title, "Engineer (Updated)");
        assert_eq!(listings[0].location, "Austin, TX");
        assert_eq!(listings[0].url, "https://acme.com/jobs/1");
        assert_eq!(trigger_calls.load(Ordering::SeqCst), 1, "declared trigger clicked");
    }

    #[test]
    fn test_resolve_link_relative_against_base() {
        let base = Url::parse("https://acme.com/careers").ok();
        assert_eq!(resolve_link(&base, "/jobs/1"), "https://acme.com/jobs/1");
        assert_eq!(
            resolve_link(&base, "https://other.com/x"),
            "https://other.com/x"
        );
        assert_eq!(resolve_link(&base, ""), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_propagates_as_discovery_error() {
        struct FailingProvider;

        #[async_trait]
        impl PageProvider for FailingProvider {
            async fn open(
                &self,
                _d: &SiteDescriptor,
            ) -> Result<Box<dyn PageSession>, DiscoveryError> {
                Err(DiscoveryError::new("connection refused"))
            }

            async fn fetch_text(&self, _url: &str) -> Result<String, DiscoveryError> {
                Err(DiscoveryError::new("connection refused"))
            }
        }

        let extractor = ListingExtractor::new(&FailingProvider);
        let result = extractor.extract(&make_descriptor()).await;
        assert!(result.is_err());
    }
}
