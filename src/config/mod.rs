//! Configuration module for Scrape-Indexer
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "SCRAPER_SETTINGS_PATH";

/// Find the settings file to load, `None` when defaults apply.
///
/// An explicit `SCRAPER_SETTINGS_PATH` must exist.
pub fn locate() -> Result<Option<PathBuf>> {
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(Some(path));
        }
        anyhow::bail!("{} points at a missing file: {}", SETTINGS_PATH_ENV, path.display());
    }

    Ok(candidate_paths().into_iter().find(|path| path.exists()))
}

/// Read `path` (defaults when `None`), then apply environment overrides and validate
pub fn load_from(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("scrape-indexer/settings.yml"));
    }
    paths
}
