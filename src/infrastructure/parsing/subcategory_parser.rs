//! Category page parser: subcategory cards

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::normalizer::to_absolute;
use super::{
    ContextualParser, ExtractContext, ParsingError, ParsingResult, SubcategorySelectors,
    compile_selector, first_attr, first_text,
};
use crate::domain::{CategoryRecord, SubcategoryRecord};

/// Extracts the first `max_per_category` subcategory cards of a category page
pub struct SubcategoryParser {
    card: Selector,
    link: Selector,
    image: Selector,
    name: Selector,
    max_per_category: Option<usize>,
}

impl SubcategoryParser {
    pub fn new(max_per_category: Option<usize>) -> ParsingResult<Self> {
        Self::with_config(&SubcategorySelectors::default(), max_per_category)
    }

    pub fn with_config(
        selectors: &SubcategorySelectors,
        max_per_category: Option<usize>,
    ) -> ParsingResult<Self> {
        Ok(Self {
            card: compile_selector(&selectors.card)?,
            link: compile_selector(&selectors.link)?,
            image: compile_selector(&selectors.image)?,
            name: compile_selector(&selectors.name)?,
            max_per_category,
        })
    }

    fn extract_card(
        &self,
        card: &ElementRef,
        context: &ExtractContext,
        parent: &CategoryRecord,
    ) -> ParsingResult<SubcategoryRecord> {
        let name = first_text(card, &self.name).ok_or_else(|| {
            ParsingError::required_field_missing("subcategory_name", "subcategory card")
        })?;
        let link = to_absolute(&context.base_origin, first_attr(card, &self.link, "href"))
            .ok_or_else(|| {
                ParsingError::required_field_missing("subcategory_link", "subcategory card")
            })?;

        Ok(SubcategoryRecord {
            name,
            image_url: to_absolute(&context.base_origin, first_attr(card, &self.image, "src")),
            link,
            parent_category_name: parent.name.clone(),
        })
    }
}

impl ContextualParser for SubcategoryParser {
    type Output = Vec<SubcategoryRecord>;
    type Parent = CategoryRecord;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &ExtractContext,
        parent: &CategoryRecord,
    ) -> ParsingResult<Self::Output> {
        // The cap applies to cards in document order, before any are dropped
        let limit = self.max_per_category.unwrap_or(usize::MAX);
        let mut subcategories = Vec::new();

        for (index, card) in html.select(&self.card).take(limit).enumerate() {
            match self.extract_card(&card, context, parent) {
                Ok(subcategory) => subcategories.push(subcategory),
                Err(e) => warn!(
                    "Skipping subcategory card {} of '{}' on {}: {}",
                    index,
                    parent.name,
                    context.page_url(),
                    e
                ),
            }
        }

        debug!(
            "Extracted {} subcategories for '{}'",
            subcategories.len(),
            parent.name
        );
        Ok(subcategories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category() -> CategoryRecord {
        CategoryRecord {
            name: "Electrical Safety".to_string(),
            image_url: None,
            description: None,
            link: "https://www.rigelmedical.com/gb/products/electrical-safety/".to_string(),
        }
    }

    fn context() -> ExtractContext {
        ExtractContext::new("https://www.rigelmedical.com", &category().link).unwrap()
    }

    fn page(cards: usize) -> Html {
        let body: String = (0..cards)
            .map(|i| {
                format!(
                    r#"<div class="col-12 col-sm-6 col-lg-4">
                         <a href="/gb/products/electrical-safety/sub-{i}/"><img src="/media/sub-{i}.png"></a>
                         <div class="panel-title">Sub {i}</div>
                       </div>"#
                )
            })
            .collect();
        Html::parse_document(&format!(r#"<div class="row">{body}</div>"#))
    }

    #[test]
    fn test_cap_keeps_first_cards_in_order() {
        let parser = SubcategoryParser::new(Some(2)).unwrap();
        let subcategories = parser
            .parse_with_context(&page(5), &context(), &category())
            .unwrap();

        assert_eq!(subcategories.len(), 2);
        assert_eq!(subcategories[0].name, "Sub 0");
        assert_eq!(subcategories[1].name, "Sub 1");
        assert_eq!(
            subcategories[1].link,
            "https://www.rigelmedical.com/gb/products/electrical-safety/sub-1/"
        );
    }

    #[test]
    fn test_parent_name_is_attached() {
        let parser = SubcategoryParser::new(Some(2)).unwrap();
        let subcategories = parser
            .parse_with_context(&page(1), &context(), &category())
            .unwrap();

        assert_eq!(subcategories.len(), 1);
        assert_eq!(subcategories[0].parent_category_name, "Electrical Safety");
    }

    #[test]
    fn test_uncapped_takes_every_card() {
        let parser = SubcategoryParser::new(None).unwrap();
        let subcategories = parser
            .parse_with_context(&page(4), &context(), &category())
            .unwrap();
        assert_eq!(subcategories.len(), 4);
    }
}
