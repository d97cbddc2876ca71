//! Listing scorer — pure, deterministic relevance score in [0, 100].
//!
//! Fuzzy token-set similarity between the listing's visible fields and the
//! candidate's résumé text, plus a small capped boost for configured
//! role-family keywords in the title. No I/O, no side effects.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

use crate::models::job::JobListing;
use crate::profile::CandidateProfile;

/// Boost added per configured title keyword found in the job title.
/// Tunable; the cap keeps keyword-stuffed titles from dominating the
/// similarity signal.
const TITLE_KEYWORD_BOOST: f64 = 8.0;
const TITLE_BOOST_CAP: f64 = 16.0;

/// Scores a listing against the candidate profile. Repeated calls with
/// identical inputs yield identical scores; ties are left to the filter
/// chain's stable ordering.
pub fn score_listing(listing: &JobListing, profile: &CandidateProfile) -> f64 {
    let fields = [
        listing.title.as_str(),
        listing.company.as_str(),
        listing.location.as_str(),
        listing.description.as_str(),
    ]
    .join("\n");

    let similarity = token_set_ratio(&profile.resume_text, &fields);

    let title_norm = normalize_for_match(&listing.title);
    let boost = profile
        .title_keywords
        .iter()
        .filter(|kw| {
            let kw_norm = normalize_for_match(kw);
            !kw_norm.is_empty() && title_norm.contains(&kw_norm)
        })
        .count() as f64
        * TITLE_KEYWORD_BOOST;

    (similarity + boost.min(TITLE_BOOST_CAP)).clamp(0.0, 100.0)
}

/// Lowercases, strips everything outside `[a-z0-9+#.-]`, and drops
/// single-character tokens. Shared by the scorer and the filter chain so
/// "Sr. Engineer (Remote)" and "sr engineer remote" normalize identically.
pub fn normalize_for_match(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '.' | '-') {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.len() > 1)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-set fuzzy similarity in [0, 100]: order- and repetition-insensitive
/// comparison built from sorted token sets, with normalized Levenshtein as
/// the base ratio.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = normalize_tokens(a);
    let tokens_b = normalize_tokens(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a
        .intersection(&tokens_b)
        .map(String::as_str)
        .collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).map(String::as_str).collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).map(String::as_str).collect();

    let common = intersection.join(" ");
    let combined_a = join_nonempty(&common, &only_a.join(" "));
    let combined_b = join_nonempty(&common, &only_b.join(" "));

    let ratios = [
        normalized_levenshtein(&common, &combined_a),
        normalized_levenshtein(&common, &combined_b),
        normalized_levenshtein(&combined_a, &combined_b),
    ];

    ratios.into_iter().fold(0.0_f64, f64::max) * 100.0
}

fn normalize_tokens(text: &str) -> BTreeSet<String> {
    normalize_for_match(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn join_nonempty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left} {right}"),
    }
}
