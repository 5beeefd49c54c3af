//! In-memory driver used by the unit tests

use super::driver::{BrowserDriver, Connector, DriverError};
use super::options::BrowserOptions;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// PNG signature, enough to stand in for a screenshot
pub(crate) const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Ordered record of driver calls shared by every fake driver of a connector
#[derive(Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Number of events equal to `name` or starting with `name:`
    pub(crate) fn count(&self, name: &str) -> usize {
        let prefix = format!("{}:", name);
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.as_str() == name || e.starts_with(&prefix))
            .count()
    }
}

#[derive(Clone)]
pub(crate) struct FakeBehavior {
    pub title: String,
    pub body: String,
    pub links: Vec<Option<String>>,
    pub scripts: Vec<Option<String>>,
    /// `None` makes the navigation-entry script fail
    pub navigation_entry: Option<Value>,
    pub goto_delay: Option<Duration>,
    /// When non-empty, only these URLs are delayed
    pub slow_urls: Vec<String>,
    pub disconnect_on_goto: bool,
    /// Remote end stuck while reading the title
    pub title_delay: Option<Duration>,
    /// Remote end stuck while deleting cookies
    pub cleanup_delay: Option<Duration>,
    pub fail_title: bool,
    pub fail_cleanup: bool,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        Self {
            title: "Example Domain".to_string(),
            body: "This domain is for use in illustrative examples.".to_string(),
            links: vec![Some("https://www.iana.org/domains/example".to_string())],
            scripts: vec![],
            navigation_entry: Some(json!({ "name": "https://example.com/", "responseStatus": 200 })),
            goto_delay: None,
            slow_urls: vec![],
            disconnect_on_goto: false,
            title_delay: None,
            cleanup_delay: None,
            fail_title: false,
            fail_cleanup: false,
        }
    }
}

pub(crate) struct FakeDriver {
    behavior: FakeBehavior,
    log: EventLog,
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.log.push(format!("goto-start:{}", url));
        if self.behavior.disconnect_on_goto {
            return Err(DriverError::Disconnected("connection reset".to_string()));
        }
        let delayed = self.behavior.slow_urls.is_empty()
            || self.behavior.slow_urls.iter().any(|u| u == url);
        if let Some(delay) = self.behavior.goto_delay.filter(|_| delayed) {
            tokio::time::sleep(delay).await;
        }
        self.log.push(format!("goto-end:{}", url));
        Ok(())
    }

    async fn wait_for_body(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn title(&mut self) -> Result<String, DriverError> {
        if let Some(delay) = self.behavior.title_delay {
            tokio::time::sleep(delay).await;
        }
        if self.behavior.fail_title {
            return Err(DriverError::Command("no such window".to_string()));
        }
        Ok(self.behavior.title.clone())
    }

    async fn body_text(&mut self) -> Result<String, DriverError> {
        Ok(self.behavior.body.clone())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        Ok(FAKE_PNG.to_vec())
    }

    async fn element_properties(
        &mut self,
        selector: &str,
        _property: &str,
    ) -> Result<Vec<Option<String>>, DriverError> {
        Ok(match selector {
            "a" => self.behavior.links.clone(),
            "script" => self.behavior.scripts.clone(),
            _ => vec![],
        })
    }

    async fn execute(&mut self, script: &str) -> Result<Value, DriverError> {
        if script.contains("Storage") {
            if self.behavior.fail_cleanup {
                return Err(DriverError::Command("storage unavailable".to_string()));
            }
            return Ok(Value::Null);
        }
        self.behavior
            .navigation_entry
            .clone()
            .ok_or_else(|| DriverError::Command("javascript error".to_string()))
    }

    async fn delete_all_cookies(&mut self) -> Result<(), DriverError> {
        self.log.push("cleanup");
        if let Some(delay) = self.behavior.cleanup_delay {
            tokio::time::sleep(delay).await;
        }
        if self.behavior.fail_cleanup {
            return Err(DriverError::Command("cookies unavailable".to_string()));
        }
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        self.log.push("quit");
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct FakeConnector {
    behavior: FakeBehavior,
    log: EventLog,
    connects: Arc<AtomicUsize>,
    unreachable: bool,
    /// Connects beyond this many are refused
    accept_limit: Option<usize>,
}

impl FakeConnector {
    pub(crate) fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            log: EventLog::default(),
            connects: Arc::new(AtomicUsize::new(0)),
            unreachable: false,
            accept_limit: None,
        }
    }

    /// Accept the first `limit` connects, refuse the rest
    pub(crate) fn accepting(behavior: FakeBehavior, limit: usize) -> Self {
        Self {
            accept_limit: Some(limit),
            ..Self::new(behavior)
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new(FakeBehavior::default())
        }
    }

    pub(crate) fn log(&self) -> EventLog {
        self.log.clone()
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _endpoint: &str,
        _options: &BrowserOptions,
    ) -> Result<Box<dyn BrowserDriver>, DriverError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        if self.unreachable || self.accept_limit.map_or(false, |limit| attempt > limit) {
            return Err(DriverError::Disconnected("connection refused".to_string()));
        }
        Ok(Box::new(FakeDriver {
            behavior: self.behavior.clone(),
            log: self.log.clone(),
        }))
    }
}
