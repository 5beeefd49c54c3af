//! Application state shared across handlers

use crate::config::Settings;
use crate::pipeline::Pipeline;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Scrape and search pipeline
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, pipeline: Arc<Pipeline>) -> Self {
        Self {
            settings: Arc::new(settings),
            pipeline,
        }
    }

    /// Index used when a request does not name one
    pub fn default_index(&self) -> &str {
        &self.settings.search_engine.default_index
    }
}
