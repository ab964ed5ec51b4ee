//! Product detail page parser
//!
//! Runs on a snapshot taken after the image readiness gate passed, so image
//! `src` attributes point at the loaded assets. Image URLs are made absolute,
//! stripped of the display-size marker, and merged primary-first without
//! duplicates.

#![allow(clippy::uninlined_format_args)]

use scraper::{Html, Selector};
use tracing::debug;

use super::normalizer::{dedup_ordered, normalize_image};
use super::spec_table::{SpecTableSynthesizer, render_spec_html};
use super::{
    ContextualParser, ExtractContext, ParsingResult, ProductDetailSelectors, compile_selector,
    element_text,
};
use crate::domain::{ProductDetailRecord, ProductSummaryRecord};

/// Parser for a single product detail page
pub struct ProductDetailParser {
    name: Selector,
    subtitle: Selector,
    description: Selector,
    identifier: Selector,
    primary_image: Selector,
    preview_images: Selector,
    spec_tables: SpecTableSynthesizer,
}

impl ProductDetailParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ProductDetailSelectors::default())
    }

    pub fn with_config(selectors: &ProductDetailSelectors) -> ParsingResult<Self> {
        Ok(Self {
            name: compile_selector(&selectors.name)?,
            subtitle: compile_selector(&selectors.subtitle)?,
            description: compile_selector(&selectors.description)?,
            identifier: compile_selector(&selectors.identifier)?,
            primary_image: compile_selector(&selectors.primary_image)?,
            preview_images: compile_selector(&selectors.preview_images)?,
            spec_tables: SpecTableSynthesizer::new(selectors)?,
        })
    }

    fn text(&self, html: &Html, selector: &Selector) -> Option<String> {
        html.select(selector).next().and_then(|el| element_text(&el))
    }

    /// Primary image first, then previews in document order, deduplicated
    fn images(&self, html: &Html, context: &ExtractContext) -> Vec<String> {
        let primary = html
            .select(&self.primary_image)
            .next()
            .and_then(|img| normalize_image(&context.base_origin, img.value().attr("src")));

        let previews = html
            .select(&self.preview_images)
            .filter_map(|img| normalize_image(&context.base_origin, img.value().attr("src")));

        dedup_ordered(primary.into_iter().chain(previews))
    }
}

impl ContextualParser for ProductDetailParser {
    type Output = ProductDetailRecord;
    type Parent = ProductSummaryRecord;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &ExtractContext,
        parent: &ProductSummaryRecord,
    ) -> ParsingResult<Self::Output> {
        let specifications = self.spec_tables.synthesize(html);
        let technical_specifications = render_spec_html(&specifications);

        let record = ProductDetailRecord {
            name: self.text(html, &self.name),
            identifier: self.text(html, &self.identifier),
            images: self.images(html, context),
            subtitle: self.text(html, &self.subtitle),
            description: self.text(html, &self.description),
            canonical_link: context
                .final_url
                .clone()
                .unwrap_or_else(|| parent.link.clone()),
            specifications,
            technical_specifications,
            parent_category_name: parent.parent_category_name.clone(),
            parent_subcategory_name: parent.parent_subcategory_name.clone(),
        };

        debug!(
            "Extracted detail for '{}': {} images, {} spec tables",
            parent.name,
            record.images.len(),
            record.specifications.len()
        );
        Ok(record)
    }
}
