//! Pipeline request and response types

use crate::error::{PipelineError, Result};
use crate::extract::ScrapedDocument;
use crate::index::IndexAck;
use serde::Serialize;
use url::Url;

/// Characters the search engine refuses in index names
const FORBIDDEN_INDEX_CHARS: [char; 11] = ['/', '\\', '*', '?', '"', '<', '>', '|', ' ', ',', '#'];

/// Check that `name` is usable as a search engine index
pub fn validate_index_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PipelineError::InvalidRequest(
            "index name must not be empty".to_string(),
        ));
    }
    if name != name.to_lowercase() {
        return Err(PipelineError::InvalidRequest(format!(
            "index name '{}' must be lowercase",
            name
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(PipelineError::InvalidRequest(format!(
            "index name '{}' contains forbidden character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// A validated request to capture and index one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    url: String,
    index: String,
}

impl ScrapeRequest {
    /// Validate `url` (absolute http/https) and `index`
    pub fn new(url: &str, index: &str) -> Result<Self> {
        let url = url.trim();
        let parsed = Url::parse(url)
            .map_err(|e| PipelineError::InvalidRequest(format!("invalid URL '{}': {}", url, e)))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(PipelineError::InvalidRequest(format!(
                    "unsupported URL scheme '{}', expected http or https",
                    scheme
                )))
            }
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(PipelineError::InvalidRequest(format!(
                "URL '{}' has no host",
                url
            )));
        }
        validate_index_name(index)?;

        Ok(Self {
            url: url.to_string(),
            index: index.to_string(),
        })
    }

    /// Request targeting the default index
    pub fn for_url(url: &str) -> Result<Self> {
        Self::new(url, crate::DEFAULT_INDEX)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn index(&self) -> &str {
        &self.index
    }
}

/// A validated free-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    index: String,
}

impl SearchQuery {
    pub fn new(text: &str, index: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "search query must not be blank".to_string(),
            ));
        }
        validate_index_name(index)?;

        Ok(Self {
            text: text.to_string(),
            index: index.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn index(&self) -> &str {
        &self.index
    }
}

/// The captured document together with the engine's acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub data: ScrapedDocument,
    pub index_response: IndexAck,
}

/// Reachability of the two upstream dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "HealthBody")]
pub struct HealthReport {
    pub browser: bool,
    pub search_engine: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.browser && self.search_engine
    }
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    browser: &'static str,
    elasticsearch: &'static str,
}

impl From<HealthReport> for HealthBody {
    fn from(report: HealthReport) -> Self {
        let probe = |ok: bool| if ok { "ok" } else { "unhealthy" };
        HealthBody {
            status: if report.is_healthy() { "ok" } else { "degraded" },
            browser: probe(report.browser),
            elasticsearch: probe(report.search_engine),
        }
    }
}
