//! Domain module - catalog records and crawl stages
//!
//! Pure data types shared by every layer. Nothing in here touches the
//! browser or the filesystem.

pub mod catalog;
pub mod stage;

pub use catalog::{
    CategoryRecord, FailureRecord, LinkRecord, ProductDetailRecord, ProductSummaryRecord,
    SpecBlock, SpecRow, SubcategoryRecord,
};
pub use stage::CrawlStage;
