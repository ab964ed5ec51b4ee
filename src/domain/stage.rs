//! Crawl stages and the artifact each one checkpoints

use serde::{Deserialize, Serialize};
use std::fmt;

/// One level of the catalog hierarchy, processed as a discrete pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrawlStage {
    Categories,       // Stage 1: landing page cards
    Subcategories,    // Stage 2: per-category listing
    ProductSummaries, // Stage 3: per-subcategory product cards
    ProductDetails,   // Stage 4: product detail pages
    ProductFailures,  // Stage 4 side output
}

impl CrawlStage {
    /// Directory (relative to the output root) holding this stage's artifacts
    pub fn directory(self) -> &'static str {
        match self {
            CrawlStage::Categories | CrawlStage::Subcategories => "category_result",
            CrawlStage::ProductSummaries => "product_initial",
            CrawlStage::ProductDetails => "results",
            CrawlStage::ProductFailures => "product_fail",
        }
    }

    /// File stem shared by every artifact of this stage
    pub fn file_stem(self) -> &'static str {
        match self {
            CrawlStage::Categories => "categories",
            CrawlStage::Subcategories => "subcategory",
            CrawlStage::ProductSummaries => "initial_products",
            CrawlStage::ProductDetails => "product",
            CrawlStage::ProductFailures => "product_fail",
        }
    }

    /// Whether the run date is part of the artifact name
    pub fn is_dated(self) -> bool {
        matches!(
            self,
            CrawlStage::ProductSummaries | CrawlStage::ProductDetails | CrawlStage::ProductFailures
        )
    }

    /// Whether an empty record set is still persisted
    pub fn writes_when_empty(self) -> bool {
        !matches!(self, CrawlStage::ProductFailures)
    }

    /// Discovery stages abort the run on any error; the detail stage isolates failures
    pub fn is_discovery(self) -> bool {
        matches!(
            self,
            CrawlStage::Categories | CrawlStage::Subcategories | CrawlStage::ProductSummaries
        )
    }
}

impl fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrawlStage::Categories => "categories",
            CrawlStage::Subcategories => "subcategories",
            CrawlStage::ProductSummaries => "product summaries",
            CrawlStage::ProductDetails => "product details",
            CrawlStage::ProductFailures => "product failures",
        };
        f.write_str(label)
    }
}
