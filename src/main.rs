//! Full catalog crawl: discovery (stages 1-3) followed by product details (stage 4)

use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = catalog_crawler::bootstrap()?;
    let pipeline = catalog_crawler::chromium_pipeline(config);

    info!("Starting catalog crawl {}", pipeline.run_id());
    let report = pipeline.run().await?;

    info!(
        categories = report.discovery.categories,
        subcategories = report.discovery.subcategories,
        products = report.discovery.products,
        details = report.details.details,
        failures = report.details.failures,
        "Scraping complete!"
    );
    Ok(())
}
