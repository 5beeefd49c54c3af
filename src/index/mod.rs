//! Search engine module
//!
//! Talks to an Elasticsearch-compatible engine over its REST API: indexing
//! scraped documents and running weighted free-text queries.

mod client;
mod models;

pub use client::{search_body, IndexClient, SEARCH_FIELDS};
pub use models::*;
