//! Description enrichment — fills in missing or stub job descriptions.
//!
//! Fetches the posting page through the page provider, then normalizes the
//! text with a structural section detector (responsibilities /
//! qualifications / about). Pages with no recognizable structure get one
//! LLM extraction pass through the provider manager. Total failure degrades
//! to a minimal title+company description with a soft warning, never a hard
//! failure.

use regex::Regex;
use tracing::{debug, warn};

use crate::discovery::page::PageProvider;
use crate::generation::prompts::build_extract_prompt;
use crate::models::job::JobListing;
use crate::providers::manager::ProviderManager;

/// Descriptions shorter than this are considered stubs worth enriching.
pub const MIN_DESCRIPTION_LEN: usize = 100;

/// Section headers recognized by the structural detector, in output order.
const SECTION_PATTERNS: &[(&str, &str)] = &[
    (
        "About",
        r"(?i)\babout (the |this )?(role|position|job|team|company)\b|\bjob description\b|\boverview\b",
    ),
    (
        "Responsibilities",
        r"(?i)\b(key )?responsibilities\b|\bwhat you.?ll do\b|\bwhat you will do\b|\byour role\b|\bin this role\b|\bjob duties\b",
    ),
    (
        "Minimum Qualifications",
        r"(?i)\bminimum qualifications\b|\bbasic qualifications\b|\brequired qualifications\b|\brequirements\b|\bmust have\b|\bwhat you.?ll need\b",
    ),
    (
        "Preferred Qualifications",
        r"(?i)\bpreferred qualifications\b|\bnice to have\b|\bbonus points\b|\bpreferred skills\b|\bdesired skills\b",
    ),
];

/// Produces the description the generation prompts will see. Enrichment
/// only ever adds information; the listing itself stays untouched.
pub async fn enrich_description(
    job: &JobListing,
    pages: &dyn PageProvider,
    providers: &ProviderManager,
) -> String {
    if job.description.len() >= MIN_DESCRIPTION_LEN {
        return normalize_sections(&job.description).unwrap_or_else(|| job.description.clone());
    }

    if job.url.is_empty() {
        warn!("No URL to enrich {} at {}; using minimal description", job.title, job.company);
        return fallback_description(job);
    }

    let page_text = match pages.fetch_text(&job.url).await {
        Ok(text) if text.len() >= MIN_DESCRIPTION_LEN => text,
        Ok(_) => {
            warn!("Fetched page for {} was too short; using minimal description", job.id);
            return fallback_description(job);
        }
        Err(e) => {
            warn!("Enrichment fetch failed for {}: {e}; using minimal description", job.id);
            return fallback_description(job);
        }
    };

    if let Some(structured) = normalize_sections(&page_text) {
        debug!("Structural sections detected for {}", job.id);
        return structured;
    }

    // No recognizable structure; one extraction pass through the manager.
    match providers.call(&build_extract_prompt(job, &page_text)).await {
        Ok(extracted) if extracted.trim().len() >= MIN_DESCRIPTION_LEN => extracted,
        Ok(_) => {
            warn!("Extraction for {} came back too short; keeping raw page text", job.id);
            page_text
        }
        Err(e) => {
            warn!("Extraction call failed for {}: {e}; keeping raw page text", job.id);
            page_text
        }
    }
}

/// Detects known section headers and reassembles the text into a
/// consistent `Header\ncontent` shape. Returns `None` when fewer than two
/// headers are found, in which case callers keep the original text.
pub fn normalize_sections(text: &str) -> Option<String> {
    let mut found: Vec<(usize, &str)> = Vec::new();

    for (name, pattern) in SECTION_PATTERNS {
        let re = Regex::new(pattern).expect("section pattern must compile");
        if let Some(m) = re.find(text) {
            found.push((m.start(), name));
        }
    }

    if found.len() < 2 {
        return None;
    }
    found.sort_by_key(|(pos, _)| *pos);

    let mut sections = Vec::with_capacity(found.len());
    for (i, (start, name)) in found.iter().enumerate() {
        let end = found.get(i + 1).map_or(text.len(), |(next, _)| *next);
        let body = text[*start..end].trim();
        if !body.is_empty() {
            sections.push(format!("{name}\n{body}"));
        }
    }

    Some(sections.join("\n\n"))
}

/// Minimal description used when every enrichment avenue fails.
pub fn fallback_description(job: &JobListing) -> String {
    format!("Position: {} at {}", job.title, job.company)
}
