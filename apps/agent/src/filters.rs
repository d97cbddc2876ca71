//! Filter chain — ordered, composable reduction of a scored listing set.
//!
//! Each stage maps `Vec<JobListing>` to a subset of itself; stages never
//! synthesize or edit listings. Stage order is part of the contract:
//! threshold, then location, then dedup, then top-per-company, then the
//! global cap. Reordering changes results.

use tracing::info;

use crate::models::job::JobListing;
use crate::scoring::normalize_for_match;

/// Region spellings that never substring-match each other. A listing in
/// "Austin, TX, USA" must pass a target of "united states", so tokens are
/// expanded to their canonical region before containment checks.
const REGION_ALIASES: &[(&str, &str)] = &[
    ("usa", "united states"),
    ("us", "united states"),
    ("u.s", "united states"),
    ("u.s.a", "united states"),
    ("america", "united states"),
    ("uk", "united kingdom"),
    ("gb", "united kingdom"),
];

/// Configuration consumed by the chain. `target_locations` empty and
/// `top_per_company` `None` disable their stages.
#[derive(Debug, Clone)]
pub struct FilterSettings {
    pub min_score: f64,
    pub target_locations: Vec<String>,
    pub top_per_company: Option<usize>,
    pub max_jobs: usize,
}

/// Runs the full chain in canonical order, logging before/after counts for
/// each stage. Input is expected in ranked order (score descending, stable
/// on discovery order); output preserves that order.
pub fn apply_filter_chain(listings: Vec<JobListing>, settings: &FilterSettings) -> Vec<JobListing> {
    let listings = run_stage("score threshold", listings, |l| {
        score_threshold(l, settings.min_score)
    });
    let listings = run_stage("location", listings, |l| {
        location_filter(l, &settings.target_locations)
    });
    let listings = run_stage("dedup", listings, dedup_listings);
    let listings = run_stage("top per company", listings, |l| {
        match settings.top_per_company {
            Some(limit) => top_per_company(l, limit),
            None => l,
        }
    });
    run_stage("global cap", listings, |l| top_k(l, settings.max_jobs))
}

fn run_stage<F>(name: &str, input: Vec<JobListing>, stage: F) -> Vec<JobListing>
where
    F: FnOnce(Vec<JobListing>) -> Vec<JobListing>,
{
    let before = input.len();
    let output = stage(input);
    info!("Filter stage '{}' kept {} of {} listings", name, output.len(), before);
    output
}

/// Keeps listings with `score >= min_score`.
pub fn score_threshold(listings: Vec<JobListing>, min_score: f64) -> Vec<JobListing> {
    listings
        .into_iter()
        .filter(|job| job.score() >= min_score)
        .collect()
}

/// Keeps listings whose location matches any configured target. An empty
/// target list is a no-op.
pub fn location_filter(listings: Vec<JobListing>, targets: &[String]) -> Vec<JobListing> {
    if targets.is_empty() {
        return listings;
    }
    listings
        .into_iter()
        .filter(|job| targets.iter().any(|t| location_matches(&job.location, t)))
        .collect()
}

/// Containment-based location match, never exact equality. Both sides are
/// normalized and region-alias-expanded, then checked for substring
/// containment in either direction, so "Austin, TX, USA" passes a target
/// of "united states".
pub fn location_matches(location: &str, target: &str) -> bool {
    let loc = expand_regions(&normalize_for_match(location));
    let tgt = expand_regions(&normalize_for_match(target));

    if loc.is_empty() || tgt.is_empty() {
        return false;
    }
    loc.contains(&tgt) || tgt.contains(&loc)
}

fn expand_regions(normalized: &str) -> String {
    let mut expanded = normalized.to_string();
    for token in normalized.split_whitespace() {
        let stripped = token.trim_end_matches('.');
        if let Some((_, canonical)) = REGION_ALIASES
            .iter()
            .find(|(alias, _)| *alias == token || *alias == stripped)
        {
            expanded.push(' ');
            expanded.push_str(canonical);
        }
    }
    expanded
}

/// Collapses listings sharing `(company, normalized title)`, keeping the
/// highest-scored occurrence. Output order follows the surviving listings'
/// input positions.
pub fn dedup_listings(listings: Vec<JobListing>) -> Vec<JobListing> {
    use std::collections::HashMap;

    let mut best_score: HashMap<(String, String), f64> = HashMap::new();
    for job in &listings {
        let key = dedup_key(job);
        let entry = best_score.entry(key).or_insert(f64::NEG_INFINITY);
        if job.score() > *entry {
            *entry = job.score();
        }
    }

    let mut taken: HashMap<(String, String), bool> = HashMap::new();
    listings
        .into_iter()
        .filter(|job| {
            let key = dedup_key(job);
            let is_best = (job.score() - best_score[&key]).abs() < f64::EPSILON;
            let already = taken.entry(key).or_insert(false);
            if is_best && !*already {
                *already = true;
                true
            } else {
                false
            }
        })
        .collect()
}

fn dedup_key(job: &JobListing) -> (String, String) {
    (
        job.company.to_lowercase(),
        normalize_for_match(&job.title),
    )
}

/// Keeps at most `limit` listings per company, highest score first
/// (input is already ranked, so the first `limit` per company win).
pub fn top_per_company(listings: Vec<JobListing>, limit: usize) -> Vec<JobListing> {
    use std::collections::HashMap;

    let mut counts: HashMap<String, usize> = HashMap::new();
    listings
        .into_iter()
        .filter(|job| {
            let count = counts.entry(job.company.to_lowercase()).or_insert(0);
            *count += 1;
            *count <= limit
        })
        .collect()
}

/// Truncates to the configured downstream working-set size.
pub fn top_k(mut listings: Vec<JobListing>, k: usize) -> Vec<JobListing> {
    listings.truncate(k);
    listings
}
