//! Page context handed to every extractor

use url::Url;

use super::{ParsingError, ParsingResult};

/// Where a snapshot came from
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Scheme + host that relative links and image paths resolve against
    pub base_origin: Url,

    /// URL the crawler navigated to
    pub requested_url: String,

    /// `window.location.href` at snapshot time, after redirects
    pub final_url: Option<String>,
}

impl ExtractContext {
    pub fn new(base_origin: &str, requested_url: &str) -> ParsingResult<Self> {
        let base_origin = Url::parse(base_origin).map_err(|e| ParsingError::InvalidBaseUrl {
            url: base_origin.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            base_origin,
            requested_url: requested_url.to_string(),
            final_url: None,
        })
    }

    pub fn with_final_url(mut self, final_url: Option<String>) -> Self {
        self.final_url = final_url.filter(|url| !url.trim().is_empty());
        self
    }

    /// Final URL when known, otherwise the requested one
    pub fn page_url(&self) -> &str {
        self.final_url.as_deref().unwrap_or(&self.requested_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_prefers_final_url() {
        let context = ExtractContext::new("https://www.rigelmedical.com", "https://a/1")
            .unwrap()
            .with_final_url(Some("https://a/2".to_string()));
        assert_eq!(context.page_url(), "https://a/2");

        let context = context.with_final_url(Some(String::new()));
        assert_eq!(context.page_url(), "https://a/1");
    }

    #[test]
    fn test_rejects_relative_base() {
        assert!(ExtractContext::new("/gb/products", "https://a/1").is_err());
    }
}
