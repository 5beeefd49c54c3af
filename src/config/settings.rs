//! Settings structures for Scrape-Indexer configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub browser: BrowserSettings,
    pub dispatcher: DispatcherSettings,
    pub search_engine: SearchEngineSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable source
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ENVIRONMENT") {
            self.general.environment = val;
        }
        if let Some(val) = lookup("LOG_LEVEL") {
            self.general.log_level = val;
        }
        if let Some(val) = lookup("LOG_DIR") {
            self.general.log_dir = Some(PathBuf::from(val)).filter(|p| !p.as_os_str().is_empty());
        }
        if let Some(val) = lookup("PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = lookup("SELENIUM_REMOTE_URL") {
            self.browser.remote_url = val;
        }
        if let Some(val) = lookup("SCRAPER_PROXY_URL") {
            self.browser.proxy = Some(val).filter(|v| !v.is_empty());
        }
        if let Some(val) = lookup("PAGE_LOAD_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.browser.page_load_timeout = secs;
            }
        }
        if let Some(val) = lookup("BROWSER_COMMAND_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.browser.command_timeout = secs;
            }
        }
        if let Some(val) = lookup("WORKER_POOL_SIZE") {
            if let Ok(size) = val.parse() {
                self.dispatcher.pool_size = size;
            }
        }
        if let Some(val) = lookup("ELASTICSEARCH_URL") {
            self.search_engine.url = val;
        }
        if let Some(val) = lookup("DEFAULT_INDEX") {
            self.search_engine.default_index = val;
        }
    }

    /// Reject settings the pipeline cannot start with
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.browser.remote_url)
            .map_err(|e| anyhow::anyhow!("invalid browser.remote_url: {}", e))?;
        Url::parse(&self.search_engine.url)
            .map_err(|e| anyhow::anyhow!("invalid search_engine.url: {}", e))?;
        if let Some(ref proxy) = self.browser.proxy {
            Url::parse(proxy).map_err(|e| anyhow::anyhow!("invalid browser.proxy: {}", e))?;
        }
        if !(self.browser.page_load_timeout > 0.0) {
            bail!("browser.page_load_timeout must be positive");
        }
        if !(self.browser.command_timeout > 0.0) {
            bail!("browser.command_timeout must be positive");
        }
        if self.dispatcher.pool_size == 0 {
            bail!("dispatcher.pool_size must be at least 1");
        }
        if self.dispatcher.queue_depth == 0 {
            bail!("dispatcher.queue_depth must be at least 1");
        }
        crate::pipeline::validate_index_name(&self.search_engine.default_index)
            .map_err(|e| anyhow::anyhow!("invalid search_engine.default_index: {}", e))?;
        Ok(())
    }

    /// Whether logs should be emitted as JSON
    pub fn is_production(&self) -> bool {
        self.general.environment.eq_ignore_ascii_case("production")
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Deployment environment ("development", "production")
    pub environment: String,
    /// Log filter directive (e.g. "info", "scrape_indexer=debug")
    pub log_level: String,
    /// Directory for rotating log files, console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_dir: Some(PathBuf::from("logs")),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

/// Remote browser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// WebDriver endpoint (Selenium standalone, chromedriver, ...)
    pub remote_url: String,
    /// Proxy the browser should route traffic through
    pub proxy: Option<String>,
    /// Run without a visible window
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Page load budget in seconds
    pub page_load_timeout: f64,
    /// Budget in seconds for extraction and cleanup commands
    pub command_timeout: f64,
}

impl BrowserSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.page_load_timeout)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.command_timeout)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            remote_url: "http://localhost:4444".to_string(),
            proxy: None,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            page_load_timeout: crate::DEFAULT_PAGE_LOAD_TIMEOUT as f64,
            command_timeout: 10.0,
        }
    }
}

/// How jobs are spread across pooled sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    RoundRobin,
    #[default]
    LeastBusy,
}

/// Worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Number of pooled browser sessions, one worker each
    pub pool_size: usize,
    /// Jobs a worker accepts before callers wait for admission
    pub queue_depth: usize,
    pub assignment: Assignment,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            pool_size: 1,
            queue_depth: 32,
            assignment: Assignment::default(),
        }
    }
}

/// Search engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchEngineSettings {
    /// Elasticsearch base URL
    pub url: String,
    /// Index used when a request does not name one
    pub default_index: String,
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Create the default index with an explicit mapping on startup
    pub ensure_index: bool,
}

impl Default for SearchEngineSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            default_index: crate::DEFAULT_INDEX.to_string(),
            request_timeout: 10.0,
            ensure_index: true,
        }
    }
}
