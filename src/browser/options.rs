//! Browser launch options

use crate::config::BrowserSettings;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use webdriver::capabilities::Capabilities;

/// Options applied to every browser session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserOptions {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub disable_gpu: bool,
    pub no_sandbox: bool,
    pub disable_dev_shm: bool,
    pub proxy: Option<String>,
    /// Server-side page load timeout
    pub page_load_timeout: Duration,
    /// Client-side budget for extraction and cleanup
    pub command_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            disable_gpu: true,
            no_sandbox: true,
            disable_dev_shm: true,
            proxy: None,
            page_load_timeout: Duration::from_secs(crate::DEFAULT_PAGE_LOAD_TIMEOUT),
            command_timeout: Duration::from_secs(10),
        }
    }
}

impl BrowserOptions {
    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self {
            headless: settings.headless,
            window_size: (settings.window_width, settings.window_height),
            proxy: settings.proxy.clone(),
            page_load_timeout: settings.page_load_timeout(),
            command_timeout: settings.command_timeout(),
            ..Default::default()
        }
    }

    /// Chrome command line arguments
    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if self.no_sandbox {
            args.push("--no-sandbox".to_string());
        }
        if self.disable_dev_shm {
            args.push("--disable-dev-shm-usage".to_string());
        }
        if self.disable_gpu {
            args.push("--disable-gpu".to_string());
        }
        args.push(format!(
            "--window-size={},{}",
            self.window_size.0, self.window_size.1
        ));
        if let Some(ref proxy) = self.proxy {
            args.push(format!("--proxy-server={}", proxy));
        }
        args
    }

    /// W3C capabilities for a new session
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": self.arguments() }),
        );
        caps.insert(
            "timeouts".to_string(),
            json!({ "pageLoad": self.page_load_timeout.as_millis() as u64 }),
        );
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arguments() {
        let args = BrowserOptions::default().arguments();
        assert_eq!(
            args,
            vec![
                "--headless=new",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--window-size=1920,1080",
            ]
        );
    }

    #[test]
    fn test_proxy_and_capabilities() {
        let options = BrowserOptions {
            proxy: Some("http://proxy:3128".to_string()),
            headless: false,
            page_load_timeout: Duration::from_secs(12),
            ..Default::default()
        };
        let args = options.arguments();
        assert!(!args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--proxy-server=http://proxy:3128".to_string()));

        let caps = options.capabilities();
        assert_eq!(caps["timeouts"]["pageLoad"], json!(12_000));
        assert!(caps["goog:chromeOptions"]["args"].is_array());
    }
}
