//! Browser session lifecycle

use super::driver::{BrowserDriver, Connector, DriverError};
use super::options::BrowserOptions;
use crate::error::{PipelineError, Result};
use crate::extract::{ContentExtractor, ScrapedDocument};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle states of a browser session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Connecting,
    Ready,
    Busy,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Connecting => "connecting",
            SessionState::Ready => "ready",
            SessionState::Busy => "busy",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

const CLEAR_LOCAL_STORAGE: &str = "window.localStorage.clear();";
const CLEAR_SESSION_STORAGE: &str = "window.sessionStorage.clear();";

/// One remote browser connection.
///
/// The dispatcher owns every session behind a mutex; the methods here are the
/// only code that touches the underlying driver.
pub struct Session {
    id: Uuid,
    endpoint: String,
    options: BrowserOptions,
    connector: Arc<dyn Connector>,
    state: SessionState,
    driver: Option<Box<dyn BrowserDriver>>,
}

impl Session {
    /// Create an unconnected session
    pub fn new(
        endpoint: impl Into<String>,
        options: BrowserOptions,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint: endpoint.into(),
            options,
            connector,
            state: SessionState::Uninitialized,
            driver: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// Establish the remote connection if there is none yet.
    ///
    /// A session that already holds a driver is left untouched.
    pub async fn connect(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(PipelineError::Connection(format!(
                "browser session {} is closed",
                self.id
            )));
        }
        if self.driver.is_some() {
            return Ok(());
        }

        self.state = SessionState::Connecting;
        let connected = self.connector.connect(&self.endpoint, &self.options).await;
        match connected {
            Ok(driver) => {
                self.driver = Some(driver);
                self.state = SessionState::Ready;
                info!(session = %self.id, endpoint = %self.endpoint, "Browser session ready");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Uninitialized;
                warn!(session = %self.id, endpoint = %self.endpoint, error = %e, "Failed to connect to browser endpoint");
                Err(PipelineError::Connection(format!(
                    "cannot reach browser endpoint {}: {}",
                    self.endpoint, e
                )))
            }
        }
    }

    /// Claim the session for one cycle. Only a ready session can become busy.
    pub(crate) fn mark_busy(&mut self) -> bool {
        if self.state == SessionState::Ready {
            self.state = SessionState::Busy;
            true
        } else {
            false
        }
    }

    /// Hand the session back after a cycle
    pub(crate) fn release(&mut self) {
        if self.state == SessionState::Busy {
            self.state = if self.driver.is_some() {
                SessionState::Ready
            } else {
                SessionState::Uninitialized
            };
        }
    }

    /// Load `url` and wait for the document body, bounded by `timeout`
    pub async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let driver = self.active_driver()?;
        let load = async {
            driver.goto(url).await?;
            driver.wait_for_body().await
        };

        let outcome = tokio::time::timeout(timeout, load).await;
        match outcome {
            Ok(Ok(())) => {
                debug!(session = %self.id, %url, "Page loaded");
                Ok(())
            }
            Ok(Err(DriverError::Timeout)) | Err(_) => {
                warn!(session = %self.id, %url, ?timeout, "Timeout occurred while loading page");
                Err(PipelineError::Timeout {
                    url: url.to_string(),
                    timeout,
                })
            }
            Ok(Err(e)) => Err(self.absorb(e)),
        }
    }

    /// Build a document from the page currently loaded, bounded by the
    /// command budget. A stuck extraction abandons the connection.
    pub async fn extract(&mut self, url: &str) -> Result<ScrapedDocument> {
        let budget = self.options.command_timeout;
        let driver = self.active_driver()?;
        let outcome = tokio::time::timeout(budget, ContentExtractor::new(driver).extract(url)).await;
        match outcome {
            Ok(result) => result.map_err(|e| self.absorb(e)),
            Err(_) => {
                warn!(session = %self.id, %url, ?budget, "Extraction timed out, abandoning browser connection");
                self.abandon();
                Err(PipelineError::Extraction(format!(
                    "extraction exceeded {:?}",
                    budget
                )))
            }
        }
    }

    /// Clear cookies and web storage. Failures are logged and swallowed.
    ///
    /// Bounded by the command budget; when it runs out the connection is
    /// abandoned and the session reconnects on its next cycle.
    pub async fn cleanup(&mut self) {
        let id = self.id;
        let budget = self.options.command_timeout;
        let Some(driver) = self.driver.as_deref_mut() else {
            debug!(session = %id, "Skipping cleanup, no live driver");
            return;
        };

        let steps = async {
            let mut failures = Vec::new();
            if let Err(e) = driver.delete_all_cookies().await {
                failures.push(format!("cookies: {}", e));
            }
            for script in [CLEAR_LOCAL_STORAGE, CLEAR_SESSION_STORAGE] {
                if let Err(e) = driver.execute(script).await {
                    failures.push(format!("storage: {}", e));
                }
            }
            failures
        };

        let outcome = tokio::time::timeout(budget, steps).await;
        match outcome {
            Ok(failures) if failures.is_empty() => {}
            Ok(failures) => {
                let err = PipelineError::Cleanup(failures.join("; "));
                warn!(session = %id, error = %err, "Cleanup failed");
            }
            Err(_) => {
                let err = PipelineError::Cleanup(format!("cleanup exceeded {:?}", budget));
                warn!(session = %id, error = %err, "Cleanup failed, abandoning browser connection");
                self.abandon();
            }
        }
    }

    /// Terminate the remote session. Calling this again is a no-op.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            debug!(session = %self.id, "Session already closed");
            return;
        }
        self.state = SessionState::Closed;

        if let Some(mut driver) = self.driver.take() {
            match driver.quit().await {
                Ok(()) => info!(session = %self.id, "Closed browser session"),
                Err(e) => warn!(session = %self.id, error = %e, "Browser session teardown failed"),
            }
        }
    }

    fn active_driver(&mut self) -> Result<&mut (dyn BrowserDriver + 'static)> {
        if self.state == SessionState::Closed {
            return Err(PipelineError::Connection(format!(
                "browser session {} is closed",
                self.id
            )));
        }
        let id = self.id;
        self.driver.as_deref_mut().ok_or_else(|| {
            PipelineError::Connection(format!("browser session {} is not connected", id))
        })
    }

    /// Drop a driver stuck on a command; its remote session is ended in the
    /// background
    fn abandon(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            return;
        };
        let id = self.id;
        let budget = self.options.command_timeout;
        tokio::spawn(async move {
            let quit = tokio::time::timeout(budget, driver.quit()).await;
            match quit {
                Ok(Ok(())) => debug!(session = %id, "Closed abandoned browser session"),
                Ok(Err(e)) => debug!(session = %id, error = %e, "Abandoned browser session teardown failed"),
                Err(_) => debug!(session = %id, "Abandoned browser session did not answer quit"),
            }
        });
    }

    /// Map a driver failure, dropping the driver when the connection is gone
    fn absorb(&mut self, err: DriverError) -> PipelineError {
        match err {
            DriverError::Disconnected(msg) => {
                warn!(session = %self.id, error = %msg, "Lost browser connection");
                self.driver = None;
                PipelineError::Connection(msg)
            }
            DriverError::Timeout => PipelineError::Extraction("browser command timed out".to_string()),
            DriverError::Command(msg) => PipelineError::Extraction(msg),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .finish()
    }
}
