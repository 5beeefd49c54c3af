//! Content extraction module
//!
//! Turns a page loaded in a browser session into a [`ScrapedDocument`].

mod document;
mod extractor;

pub use document::*;
pub use extractor::ContentExtractor;
