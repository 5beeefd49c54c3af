//! HTTP client for the search engine

use super::models::{IndexAck, RawSearchResponse, SearchResult};
use crate::config::SearchEngineSettings;
use crate::error::{PipelineError, Result};
use crate::extract::ScrapedDocument;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Fields searched by free-text queries, title boosted 3x
pub const SEARCH_FIELDS: [&str; 3] = ["title^3", "content", "metadata.links"];

/// Longest error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Query body for a weighted multi-field match
pub fn search_body(text: &str) -> Value {
    json!({
        "query": {
            "multi_match": {
                "query": text,
                "fields": SEARCH_FIELDS,
            }
        }
    })
}

/// Explicit mapping used when creating an index
fn index_mapping() -> Value {
    let link_field = json!({
        "type": "text",
        "fields": { "raw": { "type": "keyword", "ignore_above": 2048 } }
    });
    json!({
        "mappings": {
            "properties": {
                "url": { "type": "keyword" },
                "title": { "type": "text" },
                "content": { "type": "text" },
                "screenshot": { "type": "binary" },
                "captured_at": { "type": "date" },
                "error": { "type": "text" },
                "metadata": {
                    "properties": {
                        "headers": { "type": "object", "enabled": false },
                        "links": link_field,
                        "scripts": link_field,
                    }
                }
            }
        }
    })
}

/// Search engine client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct IndexClient {
    client: Client,
    base_url: String,
}

impl IndexClient {
    /// Create a client with default settings for `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_settings(&SearchEngineSettings {
            url: base_url.to_string(),
            ..Default::default()
        })
    }

    pub fn with_settings(settings: &SearchEngineSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .build()
            .map_err(|e| PipelineError::Internal(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the engine answers its root endpoint
    pub async fn ping(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Search engine ping failed: {}", e);
                false
            }
        }
    }

    /// Create `index` with the document mapping unless it already exists
    pub async fn ensure_index(&self, index: &str) -> Result<()> {
        let url = self.index_url(index, "");
        let response = self.client.head(&url).send().await?;
        match response.status() {
            status if status.is_success() => {
                debug!("Index {} already exists", index);
                return Ok(());
            }
            StatusCode::NOT_FOUND => {}
            status => {
                return Err(PipelineError::Indexing(format!(
                    "cannot inspect index {}: status {}",
                    index,
                    status.as_u16()
                )))
            }
        }

        let response = self.client.put(&url).json(&index_mapping()).send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("Created index {}", index);
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if body.contains("resource_already_exists_exception") {
            return Ok(());
        }
        Err(PipelineError::Indexing(format!(
            "cannot create index {}: status {}: {}",
            index,
            status.as_u16(),
            truncate(&body)
        )))
    }

    /// Store a document, letting the engine assign its id
    pub async fn index(&self, document: &ScrapedDocument, index: &str) -> Result<IndexAck> {
        let url = self.index_url(index, "/_doc");
        let response = self.client.post(&url).json(document).send().await?;
        let response = check(response, "index").await?;
        let ack: IndexAck = response.json().await?;

        debug!("Indexed {} into {} as {}", document.url, ack.index, ack.id);
        Ok(ack)
    }

    /// Run a free-text query against `index`
    pub async fn search(&self, text: &str, index: &str) -> Result<SearchResult> {
        let url = self.index_url(index, "/_search");
        let response = self.client.post(&url).json(&search_body(text)).send().await?;
        let response = check(response, "search").await?;
        let raw: RawSearchResponse = response.json().await?;

        let result = SearchResult::from(raw);
        debug!(
            "Search '{}' on {} matched {} documents",
            text, index, result.total
        );
        Ok(result)
    }

    fn index_url(&self, index: &str, suffix: &str) -> String {
        format!("{}/{}{}", self.base_url, urlencoding::encode(index), suffix)
    }
}

async fn check(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("Search engine rejected {}: status {}", operation, status.as_u16());
    Err(PipelineError::Indexing(format!(
        "{} failed with status {}: {}",
        operation,
        status.as_u16(),
        truncate(&body)
    )))
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_search_body_weights_title() {
        let body = search_body("rust");
        assert_eq!(body["query"]["multi_match"]["query"], "rust");
        assert_eq!(
            body["query"]["multi_match"]["fields"],
            json!(["title^3", "content", "metadata.links"])
        );
    }

    #[tokio::test]
    async fn test_index_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/web_content/_doc"))
            .and(body_partial_json(json!({ "url": "https://example.com", "error": "Page load timeout" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "_index": "web_content", "_id": "abc", "_version": 1, "result": "created"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = IndexClient::new(&server.uri()).unwrap();
        let doc = ScrapedDocument::failed("https://example.com", "Page load timeout");
        let ack = client.index(&doc, "web_content").await.unwrap();

        assert_eq!(ack.id, "abc");
        assert_eq!(ack.index, "web_content");
    }

    #[tokio::test]
    async fn test_index_rejection_is_indexing_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/web_content/_doc"))
            .respond_with(ResponseTemplate::new(400).set_body_string("mapper_parsing_exception"))
            .mount(&server)
            .await;

        let client = IndexClient::new(&server.uri()).unwrap();
        let doc = ScrapedDocument::failed("https://example.com", "boom");
        let err = client.index(&doc, "web_content").await.unwrap_err();

        assert!(matches!(err, PipelineError::Indexing(ref msg) if msg.contains("400")));
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_indexing_error() {
        let client = IndexClient::new("http://127.0.0.1:1").unwrap();
        let err = client.search("rust", "web_content").await.unwrap_err();
        assert!(matches!(err, PipelineError::Indexing(_)));
        assert!(!client.ping().await);
    }

    #[tokio::test]
    async fn test_search_sends_weighted_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages/_search"))
            .and(body_partial_json(json!({
                "query": { "multi_match": { "query": "rust", "fields": ["title^3", "content", "metadata.links"] } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {
                    "total": { "value": 7, "relation": "eq" },
                    "hits": [
                        { "_score": 3.1, "_source": { "url": "https://a.example", "title": "Rust" } },
                        { "_score": 1.0, "_source": { "url": "https://b.example", "content": "rust" } }
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = IndexClient::new(&server.uri()).unwrap();
        let result = client.search("rust", "pages").await.unwrap();

        assert_eq!(result.total, 7);
        assert!(result.results.len() as u64 <= result.total);
        assert!(result.results[0].score > result.results[1].score);
        assert_eq!(result.results[0].field("title"), Some(&json!("Rust")));
    }

    #[tokio::test]
    async fn test_ping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tagline": "You Know, for Search" })))
            .mount(&server)
            .await;

        let client = IndexClient::new(&server.uri()).unwrap();
        assert!(client.ping().await);
    }

    #[tokio::test]
    async fn test_ensure_index_creates_missing_index() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/web_content"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/web_content"))
            .and(body_partial_json(json!({
                "mappings": { "properties": { "screenshot": { "type": "binary" } } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = IndexClient::new(&server.uri()).unwrap();
        client.ensure_index("web_content").await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_index_keeps_existing_index() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/web_content"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = IndexClient::new(&server.uri()).unwrap();
        client.ensure_index("web_content").await.unwrap();
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(2000);
        assert_eq!(truncate(&body).len(), MAX_ERROR_BODY);
        assert_eq!(truncate("short"), "short");
    }
}
