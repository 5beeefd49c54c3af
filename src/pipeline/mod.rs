//! Acquisition pipeline module
//!
//! Composes the dispatcher, content extraction and the search engine client
//! into the scrape-and-index and search operations.

mod executor;
mod models;

pub use executor::Pipeline;
pub use models::*;
