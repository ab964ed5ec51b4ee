//! Application layer
//!
//! Orchestrates the crawl stages on top of the infrastructure layer.

pub mod pipeline;
pub mod stage_runner;

pub use pipeline::{CatalogPipeline, DetailReport, DiscoveryReport, PipelineReport};
pub use stage_runner::{IsolatedOutcome, ReadinessGate, StageRunner};
