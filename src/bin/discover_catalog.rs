//! Stages 1-3: categories, subcategories, and product summaries
//!
//! Writes `category_result/*.json` and the dated `product_initial`
//! checkpoint consumed by `scrape-product-details`.

use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = catalog_crawler::bootstrap()?;
    let pipeline = catalog_crawler::chromium_pipeline(config);

    let report = pipeline.run_discovery().await?;
    info!(
        "Products saved to {:?} ({} products from {} subcategories)",
        report.checkpoint, report.products, report.subcategories
    );
    Ok(())
}
