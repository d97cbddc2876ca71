//! Job listing model — the unit of work discovered from a career page.

use serde::{Deserialize, Serialize};

/// Values some career pages emit instead of a real company name.
/// A listing constructed with one of these re-derives the company from its source.
const COMPANY_PLACEHOLDERS: &[&str] = &["not specified", "not specified."];

/// A discovered job posting.
///
/// Created by the listing extractor, scored exactly once by the scorer, and
/// treated as read-only by everything downstream. Filters select listings,
/// they never edit them; enrichment results live on the `ApplicationPackage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    /// Stable identity derived from `(source, url)` at construction.
    pub id: String,
    pub company: String,
    pub title: String,
    pub location: String,
    /// Absolute URL. Relative links are resolved by the extractor before
    /// construction.
    pub url: String,
    /// Adapter identifier, e.g. `"pagefetch:acme"`.
    pub source: String,
    /// Optional; empty until enrichment fetches a full description.
    #[serde(default)]
    pub description: String,
    /// Assigned exactly once by the scorer. `None` until then.
    score: Option<f64>,
}

impl JobListing {
    /// Builds a listing, enforcing the company-from-source fallback rule:
    /// an empty or placeholder company is re-derived from the adapter suffix
    /// of `source` (`"<adapter>:<company>"`), title-cased.
    pub fn new(
        source: &str,
        title: &str,
        location: &str,
        url: &str,
        company: &str,
        description: &str,
    ) -> Self {
        let company = resolve_company(company, source);
        let id = if url.is_empty() {
            format!("{source}#{company}/{title}")
        } else {
            format!("{source}#{url}")
        };

        Self {
            id,
            company,
            title: title.trim().to_string(),
            location: location.trim().to_string(),
            url: url.to_string(),
            source: source.to_string(),
            description: description.to_string(),
            score: None,
        }
    }

    /// Records the relevance score. The score is assigned exactly once; a
    /// second assignment is ignored (and flagged in debug builds).
    pub fn set_score(&mut self, score: f64) {
        debug_assert!(self.score.is_none(), "listing score is assigned exactly once");
        self.score.get_or_insert(score);
    }

    pub fn score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// Applies the company fallback rule at creation time so downstream code
/// never needs ad hoc placeholder checks.
fn resolve_company(company: &str, source: &str) -> String {
    let trimmed = company.trim();
    let is_placeholder = trimmed.is_empty()
        || COMPANY_PLACEHOLDERS
            .iter()
            .any(|p| trimmed.eq_ignore_ascii_case(p));

    if !is_placeholder {
        return trimmed.to_string();
    }

    company_from_source(source).unwrap_or_else(|| "Unknown".to_string())
}

/// Extracts the company suffix from `"<adapter>:<company>"` and title-cases it.
fn company_from_source(source: &str) -> Option<String> {
    let suffix = source.rsplit(':').next()?.trim();
    if suffix.is_empty() || suffix == source {
        return None;
    }
    Some(title_case(suffix))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
