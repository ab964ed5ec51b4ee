//! Catalog Crawler - staged headless-browser product catalog extraction
//!
//! Walks a vendor catalog (categories → subcategories → product cards →
//! product detail pages) with a single headless Chrome page and writes each
//! level as a dated JSON checkpoint. Discovery and detail extraction are
//! separate entry points so a detail run can resume from the latest product
//! checkpoint.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::application::CatalogPipeline;
use crate::infrastructure::{AppConfig, ChromiumLauncher};
use crate::infrastructure::logging::{init_logging_with_config, log_system_info};

/// Load the layered configuration and install logging. Shared by every binary.
pub fn bootstrap() -> Result<AppConfig> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();
    Ok(config)
}

/// Pipeline driving a local Chrome/Chromium
pub fn chromium_pipeline(config: AppConfig) -> CatalogPipeline {
    let launcher = Arc::new(ChromiumLauncher::new(config.browser.clone()));
    CatalogPipeline::new(config, launcher)
}
