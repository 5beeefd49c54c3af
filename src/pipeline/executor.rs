//! Scrape-and-index orchestration

use super::models::{HealthReport, ScrapeOutcome, ScrapeRequest, SearchQuery};
use crate::browser::{BrowserOptions, Connector, Session, WebDriverConnector};
use crate::config::Settings;
use crate::dispatch::{Dispatcher, SessionSnapshot};
use crate::error::{PipelineError, Result};
use crate::extract::ScrapedDocument;
use crate::index::{IndexClient, SearchResult};
use crate::metrics::Metrics;
use futures::FutureExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// The acquisition and indexing pipeline
pub struct Pipeline {
    /// Owns the browser sessions
    dispatcher: Dispatcher,
    /// Search engine client
    index: IndexClient,
    /// Client for the browser endpoint status probe
    http: reqwest::Client,
    browser_status_url: String,
    page_load_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl Pipeline {
    /// Connect to the search engine and the browser endpoint, then start
    /// the dispatcher. Fails when either dependency is unreachable.
    pub async fn start(settings: &Settings) -> Result<Self> {
        Self::start_with(settings, Arc::new(WebDriverConnector)).await
    }

    /// Like [`Pipeline::start`] with a custom session connector
    pub async fn start_with(settings: &Settings, connector: Arc<dyn Connector>) -> Result<Self> {
        let http = status_client(settings)?;
        let index = IndexClient::with_settings(&settings.search_engine)?;
        if !index.ping().await {
            return Err(PipelineError::Connection(format!(
                "search engine at {} is unreachable",
                index.base_url()
            )));
        }
        info!("Search engine reachable at {}", index.base_url());

        if settings.search_engine.ensure_index {
            index
                .ensure_index(&settings.search_engine.default_index)
                .await?;
        }

        let options = BrowserOptions::from_settings(&settings.browser);
        let mut sessions: Vec<Session> = Vec::with_capacity(settings.dispatcher.pool_size);
        for _ in 0..settings.dispatcher.pool_size {
            let mut session = Session::new(
                settings.browser.remote_url.clone(),
                options.clone(),
                connector.clone(),
            );
            let connected = session.connect().await;
            if let Err(e) = connected {
                for mut open in sessions {
                    open.close().await;
                }
                return Err(e);
            }
            sessions.push(session);
        }

        let dispatcher = Dispatcher::start(sessions, &settings.dispatcher);
        Ok(Self::assemble(dispatcher, index, http, settings))
    }

    /// Assemble a pipeline from parts that are already running
    pub fn new(dispatcher: Dispatcher, index: IndexClient, settings: &Settings) -> Result<Self> {
        let http = status_client(settings)?;
        Ok(Self::assemble(dispatcher, index, http, settings))
    }

    fn assemble(
        dispatcher: Dispatcher,
        index: IndexClient,
        http: reqwest::Client,
        settings: &Settings,
    ) -> Self {
        Self {
            dispatcher,
            index,
            http,
            browser_status_url: format!(
                "{}/status",
                settings.browser.remote_url.trim_end_matches('/')
            ),
            page_load_timeout: settings.browser.page_load_timeout(),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn sessions(&self) -> Vec<SessionSnapshot> {
        self.dispatcher.snapshot()
    }

    /// Capture `request.url()` and index the result.
    ///
    /// A failed capture still produces and indexes an error document. Only
    /// dispatcher and indexing failures are returned as errors.
    pub async fn scrape_and_index(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome> {
        self.metrics.inc_scrape();
        let started = Instant::now();

        let url = request.url().to_string();
        let timeout = self.page_load_timeout;
        let captured = self
            .dispatcher
            .submit(move |session| capture(session, url, timeout).boxed())
            .await?;

        let elapsed = started.elapsed().as_millis() as u64;
        let document = match captured {
            Ok(document) => {
                self.metrics.record_success(elapsed);
                document
            }
            Err(e) => {
                warn!(url = %request.url(), kind = e.kind(), error = %e, "Capture failed, indexing error document");
                self.metrics.record_failure(e.kind(), elapsed);
                ScrapedDocument::failed(request.url(), e.document_message())
            }
        };

        let index_response = match self.index.index(&document, request.index()).await {
            Ok(ack) => ack,
            Err(e) => {
                self.metrics.record_indexing_failure();
                error!(url = %request.url(), index = %request.index(), error = %e, "Failed to index document");
                return Err(e);
            }
        };

        info!(
            url = %request.url(),
            index = %index_response.index,
            id = %index_response.id,
            failed = document.is_error(),
            elapsed_ms = elapsed,
            "Scrape indexed"
        );
        Ok(ScrapeOutcome {
            data: document,
            index_response,
        })
    }

    pub async fn search_indexed(&self, query: &SearchQuery) -> Result<SearchResult> {
        self.metrics.inc_search();
        self.index.search(query.text(), query.index()).await
    }

    /// Probe the browser endpoint and the search engine concurrently
    pub async fn health(&self) -> HealthReport {
        let (browser, search_engine) = tokio::join!(self.browser_ready(), self.index.ping());
        HealthReport {
            browser,
            search_engine,
        }
    }

    /// Close every browser session. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }

    async fn browser_ready(&self) -> bool {
        if self.dispatcher.is_shut_down() {
            return false;
        }

        let response = match self.http.get(&self.browser_status_url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Browser status probe failed: {}", e);
                return false;
            }
        };
        if !response.status().is_success() {
            return false;
        }

        // Selenium reports {"value": {"ready": bool}}; other endpoints may not
        match response.json::<Value>().await {
            Ok(body) => body
                .pointer("/value/ready")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            Err(_) => true,
        }
    }
}

fn status_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs_f64(settings.search_engine.request_timeout))
        .build()
        .map_err(|e| PipelineError::Internal(format!("cannot build HTTP client: {}", e)))
}

/// One navigate/extract/cleanup cycle. Cleanup runs whatever the outcome.
async fn capture(session: &mut Session, url: String, timeout: Duration) -> Result<ScrapedDocument> {
    let loaded = session.navigate(&url, timeout).await;
    let extracted = match loaded {
        Ok(()) => session.extract(&url).await,
        Err(e) => Err(e),
    };
    session.cleanup().await;
    extracted
}
