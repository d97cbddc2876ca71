//! Site descriptors — declarative selector sets for career pages.
//!
//! Known ATS platforms get preset selectors keyed by domain substring;
//! anything else falls back to generic selectors that cast a wide net.

use serde::Deserialize;
use tracing::debug;

/// Selector presets for the ATS platforms that standardize their layouts.
pub struct AtsPreset {
    pub name: &'static str,
    pub domain: &'static str,
    pub list_selector: &'static str,
    pub title_selector: &'static str,
    pub location_selector: &'static str,
    pub link_selector: &'static str,
}

pub const ATS_PRESETS: &[AtsPreset] = &[
    AtsPreset {
        name: "greenhouse",
        domain: "greenhouse.io",
        list_selector: "div.opening, div[class*='opening']",
        title_selector: "a",
        location_selector: "span.location, .location",
        link_selector: "a",
    },
    AtsPreset {
        name: "lever",
        domain: "lever.co",
        list_selector: "div.posting, div[class*='posting']",
        title_selector: "h5, a.posting-title",
        location_selector: "span.location, .location",
        link_selector: "a.posting-title, a",
    },
    AtsPreset {
        name: "workday",
        domain: "myworkdayjobs.com",
        list_selector: "li[class*='job'], ul[class*='job'] > li",
        title_selector: "h3, a[data-automation-id='jobTitle']",
        location_selector: "dd[class*='location']",
        link_selector: "a",
    },
    AtsPreset {
        name: "smartrecruiters",
        domain: "smartrecruiters.com",
        list_selector: "li[class*='opening']",
        title_selector: "h4, a[class*='link']",
        location_selector: "span[class*='location']",
        link_selector: "a",
    },
    AtsPreset {
        name: "ashby",
        domain: "ashbyhq.com",
        list_selector: "a[class*='job-posting'], div[class*='job']",
        title_selector: "h3, span[class*='title']",
        location_selector: "span[class*='location']",
        link_selector: "a",
    },
];

/// Generic fallback selectors for custom career pages.
const GENERIC_LIST_SELECTOR: &str = "div[class*='job'], li[class*='job'], a[href*='/jobs/'], \
     div[class*='posting'], div[class*='opening'], div[class*='position'], tr[class*='job']";
const GENERIC_TITLE_SELECTOR: &str =
    "h3, h4, h2, a[class*='title'], span[class*='title'], .job-title, .title, a";
const GENERIC_LOCATION_SELECTOR: &str =
    "span[class*='location'], div[class*='location'], .location, span[class*='city']";
const GENERIC_LINK_SELECTOR: &str = "a";

/// UI trigger texts that commonly gate the listings behind a click.
pub const DEFAULT_REVEAL_TRIGGERS: &[&str] = &[
    "find open roles",
    "start job search",
    "view all jobs",
    "see all openings",
    "search jobs",
    "search roles",
    "current openings",
    "explore opportunities",
    "browse jobs",
];

fn default_reveal_triggers() -> Vec<String> {
    DEFAULT_REVEAL_TRIGGERS.iter().map(|s| s.to_string()).collect()
}

fn default_max_reveal_steps() -> u32 {
    5
}

/// Declarative description of one career page: where it lives, how to find
/// listing fragments in it, and which reveal interactions it needs.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteDescriptor {
    pub url: String,
    pub company: String,
    #[serde(default)]
    pub list_selector: String,
    #[serde(default)]
    pub title_selector: String,
    #[serde(default)]
    pub location_selector: String,
    #[serde(default)]
    pub link_selector: String,
    /// Base for resolving relative listing links; defaults to the page URL.
    #[serde(default)]
    pub absolute_base: Option<String>,
    #[serde(default = "default_reveal_triggers")]
    pub reveal_triggers: Vec<String>,
    #[serde(default = "default_max_reveal_steps")]
    pub max_reveal_steps: u32,
}

impl SiteDescriptor {
    /// Adapter identifier for listings from this site.
    pub fn source(&self) -> String {
        format!("pagefetch:{}", self.company.to_lowercase())
    }

    /// Fills any empty selector from the matching ATS preset, or from the
    /// generic fallbacks when the domain is unrecognized.
    pub fn resolved(mut self) -> Self {
        let preset = detect_preset(&self.url);
        let (list, title, location, link) = match preset {
            Some(p) => {
                debug!("Using {} selector preset for {}", p.name, self.url);
                (
                    p.list_selector,
                    p.title_selector,
                    p.location_selector,
                    p.link_selector,
                )
            }
            None => (
                GENERIC_LIST_SELECTOR,
                GENERIC_TITLE_SELECTOR,
                GENERIC_LOCATION_SELECTOR,
                GENERIC_LINK_SELECTOR,
            ),
        };

        if self.list_selector.is_empty() {
            self.list_selector = list.to_string();
        }
        if self.title_selector.is_empty() {
            self.title_selector = title.to_string();
        }
        if self.location_selector.is_empty() {
            self.location_selector = location.to_string();
        }
        if self.link_selector.is_empty() {
            self.link_selector = link.to_string();
        }
        self
    }
}

/// Matches a URL to an ATS preset by domain substring.
pub fn detect_preset(url: &str) -> Option<&'static AtsPreset> {
    let url_lower = url.to_lowercase();
    ATS_PRESETS.iter().find(|p| url_lower.contains(p.domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_descriptor(url: &str) -> SiteDescriptor {
        SiteDescriptor {
            url: url.to_string(),
            company: "Acme".to_string(),
            list_selector: String::new(),
            title_selector: String::new(),
            location_selector: String::new(),
            link_selector: String::new(),
            absolute_base: None,
            reveal_triggers: default_reveal_triggers(),
            max_reveal_steps: default_max_reveal_steps(),
        }
    }

    #[test]
    fn test_source_is_pagefetch_prefixed_lowercase() {
        let descriptor = make_descriptor("https://acme.com/careers");
        assert_eq!(descriptor.source(), "pagefetch:acme");
    }

    #[test]
    fn test_detect_preset_by_domain() {
        let preset = detect_preset("https://boards.greenhouse.io/acme").unwrap();
        assert_eq!(preset.name, "greenhouse");
        let preset = detect_preset("https://jobs.lever.co/acme").unwrap();
        assert_eq!(preset.name, "lever");
        assert!(detect_preset("https://acme.com/careers").is_none());
    }

    #[test]
    fn test_resolved_fills_preset_selectors() {
        let descriptor = make_descriptor("https://boards.greenhouse.io/acme").resolved();
        assert!(descriptor.list_selector.contains("opening"));
        assert_eq!(descriptor.link_selector, "a");
    }

    #[test]
    fn test_resolved_keeps_explicit_selectors() {
        let mut descriptor = make_descriptor("https://boards.greenhouse.io/acme");
        descriptor.list_selector = "ul.custom > li".to_string();
        let resolved = descriptor.resolved();
        assert_eq!(resolved.list_selector, "ul.custom > li");
        assert!(resolved.title_selector.contains("a"));
    }

    #[test]
    fn test_resolved_generic_fallback_for_unknown_domain() {
        let descriptor = make_descriptor("https://acme.com/careers").resolved();
        assert!(descriptor.list_selector.contains("div[class*='job']"));
    }

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let descriptor: SiteDescriptor = serde_json::from_str(
            r#"{"url": "https://acme.com/careers", "company": "Acme"}"#,
        )
        .unwrap();
        assert_eq!(descriptor.max_reveal_steps, 5);
        assert!(!descriptor.reveal_triggers.is_empty());
        assert!(descriptor.absolute_base.is_none());
    }
}
