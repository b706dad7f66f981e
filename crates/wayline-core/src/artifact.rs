//! Artifact capture interface.
//!
//! The executor asks an [`ArtifactSink`] for exactly one capture per executed
//! step. What gets captured (screenshot, DOM dump...) and where it lives is
//! up to the sink.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::ActionKind;

const MAX_SLUG_CHARS: usize = 48;

/// Opaque reference to a captured artifact (path, URL, key...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(pub String);

impl ArtifactRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to capture the artifact of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureRequest {
    /// 1-based position of the step in the plan.
    pub ordinal: usize,

    /// Kind of the step.
    pub kind: ActionKind,

    /// The step's query.
    pub query: String,

    /// Filesystem-safe form of the query.
    pub slug: String,
}

impl CaptureRequest {
    pub fn new(ordinal: usize, kind: ActionKind, query: impl Into<String>) -> Self {
        let query = query.into();
        let slug = slugify(&query);
        Self {
            ordinal,
            kind,
            query,
            slug,
        }
    }

    /// Suggested file stem, e.g. `03-extract-top-heading`.
    pub fn file_stem(&self) -> String {
        format!("{:02}-{}-{}", self.ordinal, self.kind, self.slug)
    }
}

/// External collaborator recording per-step artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Capture an artifact for the step. `Ok(None)` means nothing was captured.
    async fn capture(&self, request: &CaptureRequest) -> anyhow::Result<Option<ArtifactRef>>;
}

/// Sink that never captures anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopArtifactSink;

#[async_trait]
impl ArtifactSink for NoopArtifactSink {
    async fn capture(&self, _request: &CaptureRequest) -> anyhow::Result<Option<ArtifactRef>> {
        Ok(None)
    }
}

/// Turn free text into a lowercase, dash-separated, filesystem-safe slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_CHARS));
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }

        if slug.len() >= MAX_SLUG_CHARS {
            break;
        }
    }

    slug.truncate(MAX_SLUG_CHARS);
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "step".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Click the 'Sign in' button!"), "click-the-sign-in-button");
        assert_eq!(slugify("  google.com  "), "google-com");
        assert_eq!(slugify("???"), "step");
        assert_eq!(slugify(""), "step");
    }

    #[test]
    fn test_slug_is_bounded() {
        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_CHARS);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_capture_request() {
        let request = CaptureRequest::new(3, ActionKind::Extract, "Top heading");
        assert_eq!(request.slug, "top-heading");
        assert_eq!(request.file_stem(), "03-extract-top-heading");
    }

    #[tokio::test]
    async fn test_noop_sink() {
        let request = CaptureRequest::new(1, ActionKind::Act, "open page");
        let captured = NoopArtifactSink.capture(&request).await.unwrap();
        assert!(captured.is_none());
    }
}
