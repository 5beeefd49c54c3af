//! Scraped document types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The record produced by one page load attempt.
///
/// `url` and `captured_at` are always set; the rest is either the page
/// content or an error marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedDocument {
    pub url: String,
    pub captured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: DocumentBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentBody {
    Page(PageContent),
    Failed { error: String },
}

/// Content read from a rendered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub title: String,
    /// Visible text of the document body
    pub content: String,
    /// Base64-encoded PNG
    pub screenshot: String,
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Best-effort navigation/response details; may be empty
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
}

impl ScrapedDocument {
    pub fn page(url: impl Into<String>, content: PageContent) -> Self {
        Self {
            url: url.into(),
            captured_at: Utc::now(),
            body: DocumentBody::Page(content),
        }
    }

    /// Error-marked document for a failed attempt
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            captured_at: Utc::now(),
            body: DocumentBody::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, DocumentBody::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.body {
            DocumentBody::Failed { error } => Some(error),
            DocumentBody::Page(_) => None,
        }
    }

    pub fn content(&self) -> Option<&PageContent> {
        match &self.body {
            DocumentBody::Page(page) => Some(page),
            DocumentBody::Failed { .. } => None,
        }
    }
}
