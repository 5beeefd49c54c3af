//! Driver traits and types

use super::options::BrowserOptions;
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single WebDriver command
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// The command or page load ran out of time
    #[error("timed out")]
    Timeout,
    /// The WebDriver endpoint went away or refused the session
    #[error("disconnected: {0}")]
    Disconnected(String),
    /// The command itself failed (missing element, script error, ...)
    #[error("{0}")]
    Command(String),
}

/// The subset of the WebDriver protocol the pipeline relies on.
///
/// Implementations hold a live browser session; every call is a round trip
/// to the remote end.
#[async_trait]
pub trait BrowserDriver: Send {
    /// Navigate the current window to `url`
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    /// Wait until the document has a `<body>` element
    async fn wait_for_body(&mut self) -> Result<(), DriverError>;

    /// Document title
    async fn title(&mut self) -> Result<String, DriverError>;

    /// Rendered text of the `<body>` element
    async fn body_text(&mut self) -> Result<String, DriverError>;

    /// PNG screenshot of the viewport
    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError>;

    /// Read `property` from every element matching the CSS `selector`,
    /// in document order. Elements without the property yield `None`.
    async fn element_properties(
        &mut self,
        selector: &str,
        property: &str,
    ) -> Result<Vec<Option<String>>, DriverError>;

    /// Run a synchronous script in the page and return its result
    async fn execute(&mut self, script: &str) -> Result<serde_json::Value, DriverError>;

    async fn delete_all_cookies(&mut self) -> Result<(), DriverError>;

    /// End the remote session
    async fn quit(&mut self) -> Result<(), DriverError>;
}

/// Opens driver sessions against a WebDriver endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &str,
        options: &BrowserOptions,
    ) -> Result<Box<dyn BrowserDriver>, DriverError>;
}
