//! Page content extractor

use super::document::{PageContent, PageMetadata, ScrapedDocument};
use crate::browser::{BrowserDriver, DriverError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};
use tracing::debug;

/// Reads the navigation timing entry; absent in some browsers and on error pages
const NAVIGATION_ENTRY_SCRIPT: &str = "\
    const entry = performance.getEntriesByType('navigation')[0];\
    return entry ? entry.toJSON() : null;";

/// Builds a [`ScrapedDocument`] from the page a driver has loaded
pub struct ContentExtractor<'a> {
    driver: &'a mut dyn BrowserDriver,
}

impl<'a> ContentExtractor<'a> {
    pub fn new(driver: &'a mut dyn BrowserDriver) -> Self {
        Self { driver }
    }

    /// Read title, text, screenshot and metadata.
    ///
    /// Any failing step aborts the document, except the navigation entry
    /// which is best effort.
    pub async fn extract(mut self, url: &str) -> Result<ScrapedDocument, DriverError> {
        let title = self.driver.title().await?;
        let content = self.driver.body_text().await?;
        let screenshot = STANDARD.encode(self.driver.screenshot().await?);
        let links = self.collect("a", "href").await?;
        let scripts = self.collect("script", "src").await?;
        let headers = self.navigation_entry().await;

        debug!(
            "Extracted {} ({} chars, {} links, {} scripts)",
            url,
            content.len(),
            links.len(),
            scripts.len()
        );

        Ok(ScrapedDocument::page(
            url,
            PageContent {
                title,
                content,
                screenshot,
                metadata: PageMetadata {
                    headers,
                    links,
                    scripts,
                },
            },
        ))
    }

    /// Property values of matching elements, skipping elements without one
    async fn collect(&mut self, selector: &str, property: &str) -> Result<Vec<String>, DriverError> {
        let values = self.driver.element_properties(selector, property).await?;
        Ok(values
            .into_iter()
            .flatten()
            .filter(|v| !v.trim().is_empty())
            .collect())
    }

    async fn navigation_entry(&mut self) -> Map<String, Value> {
        match self.driver.execute(NAVIGATION_ENTRY_SCRIPT).await {
            Ok(Value::Object(entry)) => entry,
            Ok(_) => Map::new(),
            Err(e) => {
                debug!("Navigation entry unavailable: {}", e);
                Map::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{FakeBehavior, FakeConnector, FAKE_PNG};
    use crate::browser::{BrowserOptions, Connector};

    async fn extract_with(behavior: FakeBehavior) -> Result<ScrapedDocument, DriverError> {
        let connector = FakeConnector::new(behavior);
        let mut driver = connector
            .connect("http://selenium:4444", &BrowserOptions::default())
            .await
            .unwrap();
        ContentExtractor::new(driver.as_mut())
            .extract("https://example.com")
            .await
    }

    #[tokio::test]
    async fn test_extracts_page_content() {
        let doc = extract_with(FakeBehavior::default()).await.unwrap();
        let page = doc.content().unwrap();

        assert_eq!(doc.url, "https://example.com");
        assert_eq!(page.title, "Example Domain");
        assert!(page.content.contains("illustrative examples"));
        assert_eq!(page.screenshot, STANDARD.encode(FAKE_PNG));
        assert_eq!(page.metadata.headers["responseStatus"], 200);
    }

    #[tokio::test]
    async fn test_skips_elements_without_target() {
        let behavior = FakeBehavior {
            links: vec![
                Some("https://a.example".to_string()),
                None,
                Some(String::new()),
                Some("https://b.example".to_string()),
            ],
            scripts: vec![None, Some("https://cdn.example/app.js".to_string()), None],
            ..Default::default()
        };
        let doc = extract_with(behavior).await.unwrap();
        let metadata = &doc.content().unwrap().metadata;

        assert_eq!(metadata.links, vec!["https://a.example", "https://b.example"]);
        assert_eq!(metadata.scripts, vec!["https://cdn.example/app.js"]);
    }

    #[tokio::test]
    async fn test_missing_navigation_entry_is_not_an_error() {
        let behavior = FakeBehavior {
            navigation_entry: None,
            ..Default::default()
        };
        let doc = extract_with(behavior).await.unwrap();
        assert!(doc.content().unwrap().metadata.headers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_step_aborts_document() {
        let behavior = FakeBehavior {
            fail_title: true,
            ..Default::default()
        };
        let err = extract_with(behavior).await.unwrap_err();
        assert!(matches!(err, DriverError::Command(_)));
    }
}
