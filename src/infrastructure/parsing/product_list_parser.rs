//! Subcategory listing parser: product cards

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::normalizer::to_absolute;
use super::{
    ContextualParser, ExtractContext, ParsingError, ParsingResult, ProductListSelectors,
    compile_selector, first_attr, first_text,
};
use crate::domain::{ProductSummaryRecord, SubcategoryRecord};

/// Parser for product cards on a subcategory listing page
pub struct ProductListParser {
    card: Selector,
    link: Selector,
    image: Selector,
    name: Selector,
    short_description: Selector,
}

impl ProductListParser {
    /// Create a new product list parser with default selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ProductListSelectors::default())
    }

    pub fn with_config(selectors: &ProductListSelectors) -> ParsingResult<Self> {
        Ok(Self {
            card: compile_selector(&selectors.card)?,
            link: compile_selector(&selectors.link)?,
            image: compile_selector(&selectors.image)?,
            name: compile_selector(&selectors.name)?,
            short_description: compile_selector(&selectors.short_description)?,
        })
    }

    fn extract_card(
        &self,
        card: &ElementRef,
        context: &ExtractContext,
        parent: &SubcategoryRecord,
    ) -> ParsingResult<ProductSummaryRecord> {
        let name = first_text(card, &self.name)
            .ok_or_else(|| ParsingError::required_field_missing("product_name", "product card"))?;
        let link = to_absolute(&context.base_origin, first_attr(card, &self.link, "href"))
            .ok_or_else(|| ParsingError::required_field_missing("product_link", "product card"))?;

        Ok(ProductSummaryRecord {
            name,
            image_url: to_absolute(&context.base_origin, first_attr(card, &self.image, "src")),
            short_description: first_text(card, &self.short_description),
            link,
            parent_category_name: parent.parent_category_name.clone(),
            parent_subcategory_name: parent.name.clone(),
        })
    }
}

impl ContextualParser for ProductListParser {
    type Output = Vec<ProductSummaryRecord>;
    type Parent = SubcategoryRecord;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &ExtractContext,
        parent: &SubcategoryRecord,
    ) -> ParsingResult<Self::Output> {
        let mut products = Vec::new();

        for (index, card) in html.select(&self.card).enumerate() {
            match self.extract_card(&card, context, parent) {
                Ok(product) => {
                    debug!("Found product: {} - {}", product.name, product.link);
                    products.push(product);
                }
                Err(e) => warn!(
                    "Skipping product card {} in '{}' on {}: {}",
                    index,
                    parent.name,
                    context.page_url(),
                    e
                ),
            }
        }

        debug!(
            "Extracted {} products from subcategory '{}'",
            products.len(),
            parent.name
        );
        Ok(products)
    }
}
