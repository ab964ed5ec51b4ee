//! HTML extraction for the catalog hierarchy
//!
//! Every extractor works on an already-serialized DOM snapshot (`scraper::Html`)
//! and never touches the browser. Selectors are compiled once from
//! `SelectorConfig` when the parser is built; a field whose selector does not
//! match degrades to `None` instead of failing the page.

pub mod category_parser;
pub mod config;
pub mod context;
pub mod error;
pub mod normalizer;
pub mod product_detail_parser;
pub mod product_list_parser;
pub mod spec_table;
pub mod subcategory_parser;

pub use category_parser::CategoryParser;
pub use config::{
    CategorySelectors, ProductDetailSelectors, ProductListSelectors, SelectorConfig,
    SubcategorySelectors,
};
pub use context::ExtractContext;
pub use error::{ParsingError, ParsingResult};
pub use product_detail_parser::ProductDetailParser;
pub use product_list_parser::ProductListParser;
pub use spec_table::{SpecTableSynthesizer, render_spec_html};
pub use subcategory_parser::SubcategoryParser;

use scraper::{ElementRef, Html, Node, Selector};

/// Parser over a page snapshot that needs the page context and the parent
/// record the page was reached from
pub trait ContextualParser {
    type Output;
    type Parent;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &ExtractContext,
        parent: &Self::Parent,
    ) -> ParsingResult<Self::Output>;
}

/// Compile a configured selector, keeping the offending string in the error
pub(crate) fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// Trimmed text of the first match; `None` when absent or blank
pub(crate) fn first_text(scope: &ElementRef, selector: &Selector) -> Option<String> {
    scope.select(selector).next().and_then(|el| element_text(&el))
}

/// Attribute of the first match that carries it
pub(crate) fn first_attr<'a>(
    scope: &ElementRef<'a>,
    selector: &Selector,
    attr: &str,
) -> Option<&'a str> {
    scope
        .select(selector)
        .find_map(|el| el.value().attr(attr))
}

/// Text nodes concatenated as written, `<br>` as a line break, trimmed
pub(crate) fn element_text(element: &ElementRef) -> Option<String> {
    let mut text = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(fragment) => text.push_str(fragment),
            Node::Element(el) if el.name() == "br" => text.push('\n'),
            _ => {}
        }
    }

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
