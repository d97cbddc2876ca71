//! Document renderer seam — turns finished artifact text into files.
//!
//! The pipeline treats rendering as best-effort: the text in the run report
//! is the canonical output, and a render failure only costs the file.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Resume,
    CoverLetter,
}

impl ArtifactKind {
    fn file_prefix(self) -> &'static str {
        match self {
            ArtifactKind::Resume => "resume",
            ArtifactKind::CoverLetter => "cover_letter",
        }
    }
}

/// Company/title context for naming rendered files.
pub struct ArtifactMeta<'a> {
    pub company: &'a str,
    pub title: &'a str,
}

#[derive(Debug, Error)]
#[error("render error: {0}")]
pub struct RenderError(String);

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(
        &self,
        text: &str,
        kind: ArtifactKind,
        meta: &ArtifactMeta<'_>,
    ) -> Result<PathBuf, RenderError>;
}

/// Default renderer: plain-text files under
/// `<output_dir>/<company>/<kind>_<slug>.txt`. PDF/DOCX renderers plug in
/// behind the same trait.
pub struct TextFileRenderer {
    output_dir: PathBuf,
}

impl TextFileRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for TextFileRenderer {
    async fn render(
        &self,
        text: &str,
        kind: ArtifactKind,
        meta: &ArtifactMeta<'_>,
    ) -> Result<PathBuf, RenderError> {
        let company_dir = self.output_dir.join(slugify(meta.company));
        fs::create_dir_all(&company_dir).await?;

        let file_name = format!(
            "{}_{}.txt",
            kind.file_prefix(),
            slugify(&format!("{}_{}", meta.company, meta.title))
        );
        let path = company_dir.join(file_name);
        fs::write(&path, text).await?;
        Ok(path)
    }
}

/// Filesystem-safe slug: non-alphanumerics collapse to `_`, capped at 80
/// chars.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_sep = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            slug.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !slug.is_empty() {
            slug.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = slug.trim_end_matches('_');
    trimmed.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_replaces_punctuation_runs() {
        assert_eq!(slugify("Acme, Inc. / Platform"), "Acme_Inc_Platform");
        assert_eq!(slugify("Sr. Engineer (L5)"), "Sr_Engineer_L5");
    }

    #[test]
    fn test_slugify_caps_length() {
        let long = "x".repeat(200);
        assert_eq!(slugify(&long).len(), 80);
    }

    #[tokio::test]
    async fn test_text_renderer_writes_under_company_dir() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TextFileRenderer::new(dir.path());
        let meta = ArtifactMeta {
            company: "Acme, Inc.",
            title: "Platform Engineer",
        };

        let path = renderer
            .render("tailored resume text", ArtifactKind::Resume, &meta)
            .await
            .unwrap();

        assert!(path.starts_with(dir.path()));
        assert!(path.to_string_lossy().contains("resume_"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "tailored resume text");
    }

    #[tokio::test]
    async fn test_render_failure_surfaces_as_render_error() {
        // A file where a directory is expected forces create_dir_all to fail.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("Acme");
        std::fs::write(&blocker, "occupied").unwrap();

        let renderer = TextFileRenderer::new(dir.path());
        let meta = ArtifactMeta {
            company: "Acme",
            title: "Engineer",
        };
        let result = renderer
            .render("text", ArtifactKind::CoverLetter, &meta)
            .await;
        assert!(result.is_err());
    }
}
