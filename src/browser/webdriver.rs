//! WebDriver backend built on `fantoccini`

use super::driver::{BrowserDriver, Connector, DriverError};
use super::options::BrowserOptions;
use async_trait::async_trait;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, ClientBuilder, Locator};
use tracing::{debug, info};

/// Live WebDriver session
pub struct WebDriverBackend {
    client: Client,
}

impl WebDriverBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrowserDriver for WebDriverBackend {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.client.goto(url).await.map_err(classify)
    }

    async fn wait_for_body(&mut self) -> Result<(), DriverError> {
        self.client
            .wait()
            .for_element(Locator::Css("body"))
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn title(&mut self) -> Result<String, DriverError> {
        self.client.title().await.map_err(classify)
    }

    async fn body_text(&mut self) -> Result<String, DriverError> {
        let body = self
            .client
            .find(Locator::Css("body"))
            .await
            .map_err(classify)?;
        body.text().await.map_err(classify)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.client.screenshot().await.map_err(classify)
    }

    async fn element_properties(
        &mut self,
        selector: &str,
        property: &str,
    ) -> Result<Vec<Option<String>>, DriverError> {
        let elements = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(classify)?;

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(element.prop(property).await.map_err(classify)?);
        }
        Ok(values)
    }

    async fn execute(&mut self, script: &str) -> Result<serde_json::Value, DriverError> {
        self.client.execute(script, vec![]).await.map_err(classify)
    }

    async fn delete_all_cookies(&mut self) -> Result<(), DriverError> {
        self.client.delete_all_cookies().await.map_err(classify)
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        self.client.clone().close().await.map_err(classify)
    }
}

/// Opens sessions on a remote WebDriver endpoint
#[derive(Debug, Clone, Default)]
pub struct WebDriverConnector;

#[async_trait]
impl Connector for WebDriverConnector {
    async fn connect(
        &self,
        endpoint: &str,
        options: &BrowserOptions,
    ) -> Result<Box<dyn BrowserDriver>, DriverError> {
        debug!("Opening WebDriver session at {} with {:?}", endpoint, options.arguments());

        let client = ClientBuilder::native()
            .capabilities(options.capabilities())
            .connect(endpoint)
            .await
            .map_err(|e| DriverError::Disconnected(e.to_string()))?;

        info!("Connected to WebDriver endpoint at {}", endpoint);
        Ok(Box::new(WebDriverBackend::new(client)))
    }
}

fn classify(err: CmdError) -> DriverError {
    match err {
        CmdError::WaitTimeout => DriverError::Timeout,
        CmdError::Standard(ref wd) if matches!(wd.error, ErrorStatus::Timeout) => {
            DriverError::Timeout
        }
        CmdError::Standard(ref wd) if matches!(wd.error, ErrorStatus::InvalidSessionId) => {
            DriverError::Disconnected(err.to_string())
        }
        CmdError::Lost(_) => DriverError::Disconnected(err.to_string()),
        other => DriverError::Command(other.to_string()),
    }
}
