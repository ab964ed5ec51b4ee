//! Catalog pipeline
//!
//! Wires the stages together:
//!
//! 1. categories (landing page)
//! 2. subcategories (per category, capped)
//! 3. product summaries (per subcategory) → `product_initial` checkpoint
//! 4. product details (per summary, from the latest checkpoint) →
//!    `results` checkpoint + `product_fail` log
//!
//! Stages 1-3 and stage 4 can run separately; stage 4 only depends on the
//! checkpoint, never on in-memory state from a discovery run.

#![allow(clippy::uninlined_format_args)]

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use super::stage_runner::{ReadinessGate, StageRunner};
use crate::domain::{CrawlStage, ProductSummaryRecord};
use crate::infrastructure::browser::BrowserLauncher;
use crate::infrastructure::checkpoint::CheckpointStore;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::crawl_error::{CrawlError, CrawlResult};
use crate::infrastructure::parsing::{
    CategoryParser, ParsingError, ProductDetailParser, ProductListParser, SubcategoryParser,
};
use crate::infrastructure::session::{PageSessionManager, SessionSettings};

/// Outcome of stages 1-3
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub categories: usize,
    pub subcategories: usize,
    pub products: usize,
    pub recycles: usize,
    /// Product summary checkpoint written by this run
    pub checkpoint: PathBuf,
}

/// Outcome of stage 4
#[derive(Debug, Clone, Serialize)]
pub struct DetailReport {
    /// Product summary checkpoint the stage resumed from
    pub source_checkpoint: PathBuf,
    pub inputs: usize,
    pub details: usize,
    pub failures: usize,
    pub recycles: usize,
    pub results_path: Option<PathBuf>,
    /// Absent when every product succeeded
    pub failures_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub discovery: DiscoveryReport,
    pub details: DetailReport,
}

pub struct CatalogPipeline {
    config: AppConfig,
    launcher: Arc<dyn BrowserLauncher>,
    store: CheckpointStore,
    run_id: Uuid,
    run_date: NaiveDate,
}

impl CatalogPipeline {
    pub fn new(config: AppConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        let store = CheckpointStore::from_config(&config.checkpoint);
        Self {
            config,
            launcher,
            store,
            run_id: Uuid::new_v4(),
            run_date: Utc::now().date_naive(),
        }
    }

    /// Override the date stamped on artifacts (UTC today by default)
    pub fn with_run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = run_date;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Discovery followed by detail extraction
    pub async fn run(&self) -> CrawlResult<PipelineReport> {
        let discovery = self.run_discovery().await?;
        let details = self.run_details().await?;

        Ok(PipelineReport {
            run_id: self.run_id,
            run_date: self.run_date,
            discovery,
            details,
        })
    }

    /// Stages 1-3. Any error is fatal and names the page that caused it.
    pub async fn run_discovery(&self) -> CrawlResult<DiscoveryReport> {
        let span = info_span!("discovery", run_id = %self.run_id, date = %self.run_date);
        async {
            let mut session = self.session();
            let result = self.discover(&mut session).await;
            session.shutdown().await;

            match &result {
                Ok(report) => info!(
                    categories = report.categories,
                    subcategories = report.subcategories,
                    products = report.products,
                    recycles = report.recycles,
                    "Discovery complete"
                ),
                Err(e) => error!("Discovery aborted: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Stage 4 from the most recent product summary checkpoint. Per-product
    /// failures are recorded, not raised.
    pub async fn run_details(&self) -> CrawlResult<DetailReport> {
        let span = info_span!("details", run_id = %self.run_id, date = %self.run_date);
        let result = self.scrape_details().instrument(span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| error!("Product detail stage aborted: {}", e));
        }
        result
    }

    fn session(&self) -> PageSessionManager {
        PageSessionManager::new(
            Arc::clone(&self.launcher),
            SessionSettings::from_config(&self.config),
        )
    }

    async fn scrape_details(&self) -> CrawlResult<DetailReport> {
        // Resolve the checkpoint before any browser is launched
        let (source_checkpoint, products): (PathBuf, Vec<ProductSummaryRecord>) = self
            .store
            .read_latest(CrawlStage::ProductSummaries)
            .await?;
        info!(
            "Loaded {} products from {:?}",
            products.len(),
            source_checkpoint
        );

        let parser = ProductDetailParser::with_config(&self.config.selectors.product_detail)
            .map_err(selector_error)?;
        let gate = ReadinessGate::product_images(&self.config);

        info!("Scraping product details...");
        let mut session = self.session();
        let mut runner = StageRunner::new(&mut session, &self.config.site.base_origin);
        let outcome = runner.run_isolated(&products, &parser, Some(&gate)).await;
        let recycles = runner.recycle_count();
        session.shutdown().await;

        let results_path = self
            .store
            .write_stage(CrawlStage::ProductDetails, self.run_date, &outcome.records)
            .await?;
        let failures_path = self
            .store
            .write_stage(CrawlStage::ProductFailures, self.run_date, &outcome.failures)
            .await?;
        if failures_path.is_none() {
            info!("No failed product scrapes.");
        }

        let report = DetailReport {
            source_checkpoint,
            inputs: products.len(),
            details: outcome.records.len(),
            failures: outcome.failures.len(),
            recycles,
            results_path,
            failures_path,
        };
        info!(
            inputs = report.inputs,
            details = report.details,
            failures = report.failures,
            recycles = report.recycles,
            "Product scraping complete"
        );
        Ok(report)
    }

    async fn discover(&self, session: &mut PageSessionManager) -> CrawlResult<DiscoveryReport> {
        let selectors = &self.config.selectors;
        let category_parser =
            CategoryParser::with_config(&selectors.category).map_err(selector_error)?;
        let subcategory_parser = SubcategoryParser::with_config(
            &selectors.subcategory,
            self.config.crawl.subcategory_cap(),
        )
        .map_err(selector_error)?;
        let product_parser =
            ProductListParser::with_config(&selectors.product_list).map_err(selector_error)?;

        let mut runner = StageRunner::new(session, &self.config.site.base_origin);

        info!("Scraping categories...");
        let categories = runner
            .run_page(&self.config.site.catalog_url, &category_parser, &())
            .await?;
        self.store
            .write_stage(CrawlStage::Categories, self.run_date, &categories)
            .await?;

        info!("Scraping subcategories...");
        let subcategories = runner.run_discovery(&categories, &subcategory_parser).await?;
        self.store
            .write_stage(CrawlStage::Subcategories, self.run_date, &subcategories)
            .await?;

        info!("Scraping initial product data...");
        let products = runner.run_discovery(&subcategories, &product_parser).await?;
        let checkpoint = self
            .store
            .write_stage(CrawlStage::ProductSummaries, self.run_date, &products)
            .await?
            .ok_or_else(|| {
                CrawlError::checkpoint(
                    self.store.stage_dir(CrawlStage::ProductSummaries),
                    "product summary checkpoint was not written",
                )
            })?;

        Ok(DiscoveryReport {
            categories: categories.len(),
            subcategories: subcategories.len(),
            products: products.len(),
            recycles: runner.recycle_count(),
            checkpoint,
        })
    }
}

fn selector_error(e: ParsingError) -> CrawlError {
    CrawlError::Configuration {
        message: e.to_string(),
    }
}
