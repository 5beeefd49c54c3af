//! Scrape-Indexer: capture rendered web pages through a remote browser and
//! index them into a search engine for later free-text retrieval.
//!
//! The acquisition path runs through a pool of WebDriver sessions guarded by
//! the [`dispatch::Dispatcher`]; documents are stored in an
//! Elasticsearch-compatible index through [`index::IndexClient`].

pub mod browser;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod index;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod web;

pub use config::Settings;
pub use error::PipelineError;
pub use extract::ScrapedDocument;
pub use index::{IndexAck, IndexClient, SearchResult};
pub use pipeline::{Pipeline, ScrapeOutcome, ScrapeRequest, SearchQuery};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Index used when a request does not name one
pub const DEFAULT_INDEX: &str = "web_content";

/// Default page load budget in seconds
pub const DEFAULT_PAGE_LOAD_TIMEOUT: u64 = 30;

/// Error payload stored in place of page content when the load budget runs out
pub const PAGE_LOAD_TIMEOUT_MESSAGE: &str = "Page load timeout";
