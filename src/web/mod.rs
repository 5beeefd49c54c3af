//! Web server module
//!
//! Exposes the scrape, search, health and stats endpoints over HTTP.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
