//! Parsing error types

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Required field '{field}' not found in {context}")]
    RequiredFieldMissing { field: String, context: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl std::fmt::Debug) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: format!("{reason:?}"),
        }
    }

    pub fn required_field_missing(field: &str, context: &str) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
