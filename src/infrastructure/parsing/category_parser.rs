//! Category landing page parser

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::normalizer::to_absolute;
use super::{
    CategorySelectors, ContextualParser, ExtractContext, ParsingError, ParsingResult,
    compile_selector, first_attr, first_text,
};
use crate::domain::CategoryRecord;

/// Extracts one `CategoryRecord` per category card
pub struct CategoryParser {
    card: Selector,
    link: Selector,
    image: Selector,
    name: Selector,
    description: Selector,
}

impl CategoryParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&CategorySelectors::default())
    }

    pub fn with_config(selectors: &CategorySelectors) -> ParsingResult<Self> {
        Ok(Self {
            card: compile_selector(&selectors.card)?,
            link: compile_selector(&selectors.link)?,
            image: compile_selector(&selectors.image)?,
            name: compile_selector(&selectors.name)?,
            description: compile_selector(&selectors.description)?,
        })
    }

    fn extract_card(
        &self,
        card: &ElementRef,
        context: &ExtractContext,
    ) -> ParsingResult<CategoryRecord> {
        let name = first_text(card, &self.name)
            .ok_or_else(|| ParsingError::required_field_missing("category_name", "category card"))?;
        let link = to_absolute(&context.base_origin, first_attr(card, &self.link, "href"))
            .ok_or_else(|| ParsingError::required_field_missing("category_link", "category card"))?;

        Ok(CategoryRecord {
            name,
            image_url: to_absolute(&context.base_origin, first_attr(card, &self.image, "src")),
            description: first_text(card, &self.description),
            link,
        })
    }
}

impl ContextualParser for CategoryParser {
    type Output = Vec<CategoryRecord>;
    type Parent = ();

    fn parse_with_context(
        &self,
        html: &Html,
        context: &ExtractContext,
        _parent: &(),
    ) -> ParsingResult<Self::Output> {
        let mut categories = Vec::new();

        for (index, card) in html.select(&self.card).enumerate() {
            match self.extract_card(&card, context) {
                Ok(category) => categories.push(category),
                Err(e) => warn!(
                    "Skipping category card {} on {}: {}",
                    index,
                    context.page_url(),
                    e
                ),
            }
        }

        debug!(
            "Extracted {} categories from {}",
            categories.len(),
            context.page_url()
        );
        Ok(categories)
    }
}
