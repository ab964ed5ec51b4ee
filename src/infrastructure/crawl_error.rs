//! Crawl error types
//!
//! Every failure the pipeline can observe is classified here. Discovery
//! stages propagate these with `?`; the detail stage turns them into
//! `FailureRecord`s through `Display`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CrawlError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Images on {url} did not finish loading within {timeout_ms} ms")]
    ReadinessTimeout { url: String, timeout_ms: u64 },

    #[error("Extraction failed on {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("No '{prefix}*' checkpoint found in {}", .directory.display())]
    CheckpointMissing { directory: PathBuf, prefix: String },

    #[error("Checkpoint I/O failed for {}: {reason}", .path.display())]
    Checkpoint { path: PathBuf, reason: String },

    #[error("Browser session error: {reason}")]
    Browser { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl CrawlError {
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn readiness_timeout(url: &str, timeout_ms: u64) -> Self {
        Self::ReadinessTimeout {
            url: url.to_string(),
            timeout_ms,
        }
    }

    pub fn extraction(url: &str, reason: impl ToString) -> Self {
        Self::Extraction {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn checkpoint(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Checkpoint {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn browser(reason: impl ToString) -> Self {
        Self::Browser {
            reason: reason.to_string(),
        }
    }

    /// Errors scoped to a single page; the detail stage records these and moves on
    pub fn is_item_scoped(&self) -> bool {
        matches!(
            self,
            Self::Navigation { .. } | Self::ReadinessTimeout { .. } | Self::Extraction { .. }
        )
    }

    /// URL of the page that caused the error, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Navigation { url, .. }
            | Self::ReadinessTimeout { url, .. }
            | Self::Extraction { url, .. } => Some(url),
            _ => None,
        }
    }
}

pub type CrawlResult<T> = Result<T, CrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_reference_offending_url() {
        let err = CrawlError::navigation("https://example.com/a", "net::ERR_TIMED_OUT");
        assert_eq!(
            err.to_string(),
            "Navigation to https://example.com/a failed: net::ERR_TIMED_OUT"
        );
        assert_eq!(err.url(), Some("https://example.com/a"));
    }

    #[test]
    fn test_item_scope_classification() {
        assert!(CrawlError::readiness_timeout("https://example.com", 60_000).is_item_scoped());
        assert!(CrawlError::extraction("https://example.com", "detached").is_item_scoped());
        assert!(!CrawlError::browser("launch failed").is_item_scoped());

        let missing = CrawlError::CheckpointMissing {
            directory: PathBuf::from("product_initial"),
            prefix: "initial_products_".to_string(),
        };
        assert!(!missing.is_item_scoped());
        assert_eq!(missing.url(), None);
        assert_eq!(
            missing.to_string(),
            "No 'initial_products_*' checkpoint found in product_initial"
        );
    }
}
