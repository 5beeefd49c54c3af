//! Remote browser session management
//!
//! Wraps a WebDriver connection behind the [`BrowserDriver`] trait and tracks
//! the lifecycle of each connection as a [`Session`].

mod driver;
mod options;
mod session;
mod webdriver;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{BrowserDriver, Connector, DriverError};
pub use options::BrowserOptions;
pub use session::{Session, SessionState};
pub use webdriver::{WebDriverBackend, WebDriverConnector};
