//! Stage 4: product details from the latest `product_initial` checkpoint
//!
//! Fails before launching a browser when no checkpoint exists.

use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = catalog_crawler::bootstrap()?;
    let pipeline = catalog_crawler::chromium_pipeline(config);

    let report = pipeline.run_details().await?;
    if let Some(path) = &report.results_path {
        info!("Product details saved to {:?}", path);
    }
    if let Some(path) = &report.failures_path {
        info!("Failed product details saved to {:?}", path);
    }
    Ok(())
}
