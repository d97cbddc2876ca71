//! Page content provider seam.
//!
//! The pipeline never touches a browser directly: discovery talks to a
//! `PageProvider` that opens a `PageSession` per site, and enrichment asks
//! it for a page's visible text. The default implementation is plain
//! HTTP + HTML parsing; a headless-browser implementation plugs in behind
//! the same traits.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::discovery::descriptor::SiteDescriptor;

/// Recoverable per-source failure. Discovery degrades the affected source
/// to zero listings; it never aborts the run.
#[derive(Debug, Error)]
#[error("discovery error: {0}")]
pub struct DiscoveryError(String);

impl DiscoveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// One raw listing fragment pulled out of a page, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawFragment {
    pub title: String,
    pub location: String,
    pub href: String,
}

/// An open page that the reveal state machine can poke at.
#[async_trait]
pub trait PageSession: Send {
    /// Attempts to click a text-matched UI trigger. Returns whether a
    /// matching element was found and activated.
    async fn trigger_reveal(&mut self, text: &str) -> Result<bool, DiscoveryError>;

    /// Triggers "load more content" (scroll-to-bottom or equivalent).
    async fn load_more(&mut self) -> Result<(), DiscoveryError>;

    /// Content-size fingerprint used by the convergence loop.
    fn fingerprint(&self) -> u64;

    /// Extracts raw listing fragments using the descriptor's selectors.
    fn fragments(&self, descriptor: &SiteDescriptor) -> Result<Vec<RawFragment>, DiscoveryError>;
}

#[async_trait]
pub trait PageProvider: Send + Sync {
    async fn open(&self, descriptor: &SiteDescriptor)
        -> Result<Box<dyn PageSession>, DiscoveryError>;

    /// Fetches a page and returns its visible text, scripts and chrome
    /// stripped. Used by enrichment to pull full job descriptions.
    async fn fetch_text(&self, url: &str) -> Result<String, DiscoveryError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Cap on extracted page text; generation prompts don't need more.
const MAX_PAGE_TEXT: usize = 10_000;

/// Plain-HTTP page provider. Reveal interactions are no-ops here (there is
/// no JS runtime), so the convergence loop sees a stable fingerprint and
/// terminates after its two confirmation checks.
pub struct HttpPageProvider {
    client: reqwest::Client,
}

impl HttpPageProvider {
    pub fn new(timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn get(&self, url: &str) -> Result<String, DiscoveryError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::new(format!("{url} returned {status}")));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageProvider for HttpPageProvider {
    async fn open(
        &self,
        descriptor: &SiteDescriptor,
    ) -> Result<Box<dyn PageSession>, DiscoveryError> {
        let html = self.get(&descriptor.url).await?;
        Ok(Box::new(HttpPageSession { html }))
    }

    async fn fetch_text(&self, url: &str) -> Result<String, DiscoveryError> {
        let html = self.get(url).await?;
        Ok(visible_text(&html))
    }
}

struct HttpPageSession {
    html: String,
}

#[async_trait]
impl PageSession for HttpPageSession {
    async fn trigger_reveal(&mut self, _text: &str) -> Result<bool, DiscoveryError> {
        Ok(false)
    }

    async fn load_more(&mut self) -> Result<(), DiscoveryError> {
        Ok(())
    }

    fn fingerprint(&self) -> u64 {
        self.html.len() as u64
    }

    fn fragments(&self, descriptor: &SiteDescriptor) -> Result<Vec<RawFragment>, DiscoveryError> {
        extract_fragments(&self.html, descriptor)
    }
}

/// Selector-driven fragment extraction, shared by any session that holds
/// rendered HTML.
pub fn extract_fragments(
    html: &str,
    descriptor: &SiteDescriptor,
) -> Result<Vec<RawFragment>, DiscoveryError> {
    let document = Html::parse_document(html);
    let list = parse_selector(&descriptor.list_selector)?;
    let title = parse_selector(&descriptor.title_selector)?;
    let location = parse_selector(&descriptor.location_selector)?;
    let link = parse_selector(&descriptor.link_selector)?;

    let mut fragments = Vec::new();
    for item in document.select(&list) {
        let title_text = item
            .select(&title)
            .next()
            .map(element_text)
            .unwrap_or_else(|| truncate(&element_text(item), 100));

        let location_text = item
            .select(&location)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let href = item
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .or_else(|| item.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        fragments.push(RawFragment {
            title: title_text,
            location: location_text,
            href,
        });
    }

    Ok(fragments)
}

fn parse_selector(raw: &str) -> Result<Selector, DiscoveryError> {
    Selector::parse(raw)
        .map_err(|e| DiscoveryError::new(format!("invalid selector {raw:?}: {e:?}")))
}

fn element_text(element: ElementRef) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&joined)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible-text extraction: walks the DOM skipping script/style and page
/// chrome, then collapses whitespace and caps length.
pub fn visible_text(html: &str) -> String {
    const SKIPPED: &[&str] = &["script", "style", "nav", "header", "footer", "noscript"];

    let document = Html::parse_document(html);
    let mut raw = String::new();

    for node in document.tree.root().descendants() {
        if let scraper::Node::Text(text) = node.value() {
            let in_chrome = node.ancestors().any(|ancestor| {
                matches!(ancestor.value(),
                    scraper::Node::Element(element) if SKIPPED.contains(&element.name()))
            });
            if !in_chrome {
                raw.push_str(text);
                raw.push(' ');
            }
        }
    }

    truncate(&collapse_whitespace(&raw), MAX_PAGE_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_descriptor() -> SiteDescriptor {
        let descriptor: SiteDescriptor = serde_json::from_str(
            r#"{
                "url": "https://acme.com/careers",
                "company": "Acme",
                "list_selector": "div.opening",
                "title_selector": "h3",
                "location_selector": ".location",
                "link_selector": "a"
            }"#,
        )
        .unwrap();
        descriptor
    }

    const LISTING_HTML: &str = r#"
        <html><body>
        <div class="opening">
            <h3>Platform Engineer</h3>
            <span class="location">Austin, TX, USA</span>
            <a href="/jobs/platform-engineer">Apply</a>
        </div>
        <div class="opening">
            <h3>Data   Engineer</h3>
            <span class="location">Remote</span>
            <a href="https://acme.com/jobs/data-engineer">Apply</a>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_extract_fragments_reads_title_location_href() {
        let fragments = extract_fragments(LISTING_HTML, &make_descriptor()).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].title, "Platform Engineer");
        assert_eq!(fragments[0].location, "Austin, TX, USA");
        assert_eq!(fragments[0].href, "/jobs/platform-engineer");
        assert_eq!(fragments[1].title, "Data Engineer");
        assert_eq!(fragments[1].href, "https://acme.com/jobs/data-engineer");
    }

    #[test]
    fn test_extract_fragments_falls_back_to_item_text_for_title() {
        let html = r#"<div class="opening"><a href="/j/1">Senior Rust Engineer</a></div>"#;
        let mut descriptor = make_descriptor();
        descriptor.title_selector = "h9".to_string();
        let fragments = extract_fragments(html, &descriptor).unwrap();
        assert_eq!(fragments[0].title, "Senior Rust Engineer");
    }

    #[test]
    fn test_invalid_selector_is_a_discovery_error() {
        let mut descriptor = make_descriptor();
        descriptor.list_selector = ":::".to_string();
        assert!(extract_fragments(LISTING_HTML, &descriptor).is_err());
    }

    #[test]
    fn test_visible_text_strips_scripts_and_chrome() {
        let html = r#"
            <html><head><style>.x { color: red; }</style></head>
            <body>
                <nav>Home About</nav>
                <script>var tracking = true;</script>
                <p>Build  distributed   systems in Rust.</p>
                <footer>© Acme</footer>
            </body></html>
        "#;
        let text = visible_text(html);
        assert!(text.contains("Build distributed systems in Rust."));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color"));
        assert!(!text.contains("Home About"));
    }

    #[test]
    fn test_visible_text_is_capped() {
        let body = "word ".repeat(5_000);
        let html = format!("<html><body><p>{body}</p></body></html>");
        assert!(visible_text(&html).len() <= MAX_PAGE_TEXT);
    }
}
