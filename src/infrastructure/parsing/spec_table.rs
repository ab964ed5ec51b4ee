//! Specification table synthesis
//!
//! A detail page carries zero or more spec tables. The first header cell of a
//! table is its title, row 0 is the header row, and every later row with at
//! least two data cells is a `(name, value)` pair. Tables without a title are
//! ignored.

use scraper::{Html, Selector};

use super::{ParsingResult, ProductDetailSelectors, compile_selector, element_text};
use crate::domain::SpecBlock;

pub struct SpecTableSynthesizer {
    table: Selector,
    title_cell: Selector,
    row: Selector,
    cell: Selector,
}

impl SpecTableSynthesizer {
    pub fn new(selectors: &ProductDetailSelectors) -> ParsingResult<Self> {
        Ok(Self {
            table: compile_selector(&selectors.spec_table)?,
            title_cell: compile_selector(&selectors.spec_title_cell)?,
            row: compile_selector(&selectors.spec_row)?,
            cell: compile_selector(&selectors.spec_cell)?,
        })
    }

    /// Spec blocks in document order
    pub fn synthesize(&self, html: &Html) -> Vec<SpecBlock> {
        let mut blocks = Vec::new();

        for table in html.select(&self.table) {
            let Some(title_cell) = table.select(&self.title_cell).next() else {
                continue;
            };

            let mut block = SpecBlock::new(element_text(&title_cell).unwrap_or_default());

            for row in table.select(&self.row).skip(1) {
                let mut cells = row.select(&self.cell);
                let (Some(name), Some(value)) = (cells.next(), cells.next()) else {
                    continue;
                };
                block.push_row(
                    element_text(&name).unwrap_or_default(),
                    element_text(&value).unwrap_or_default(),
                );
            }

            blocks.push(block);
        }

        blocks
    }
}

/// Render spec blocks in the HTML shape older catalog importers consume:
/// an `<h3>` title and a two-column bordered table per block, blocks
/// separated by `<br><br>`.
pub fn render_spec_html(blocks: &[SpecBlock]) -> String {
    let mut html = String::new();

    for block in blocks {
        html.push_str(&format!("<h3>{}</h3>", block.table_title));
        html.push_str(r#"<table border="1" style="border-collapse: collapse; width: 100%;">"#);
        html.push_str("<thead><tr><th>Spec Name</th><th>Spec Value</th></tr></thead><tbody>");
        for row in &block.rows {
            html.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>", row.name, row.value));
        }
        html.push_str("</tbody></table><br><br>");
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TABLES: &str = r#"
        <div id="specsList">
          <table class="table">
            <tr><th>Electrical</th></tr>
            <tr><td>Voltage</td><td> 230 V </td></tr>
            <tr><td>Current</td><td>16 A</td></tr>
          </table>
          <table class="table">
            <tr><th>Physical</th></tr>
            <tr><td>Weight</td><td>1.2 kg</td></tr>
            <tr><td>orphan cell</td></tr>
          </table>
          <table class="table">
            <tr><td>No</td><td>title</td></tr>
          </table>
        </div>
        <table class="table"><tr><th>Outside the list</th></tr></table>
    "#;

    fn synthesizer() -> SpecTableSynthesizer {
        SpecTableSynthesizer::new(&ProductDetailSelectors::default()).unwrap()
    }

    #[test]
    fn test_blocks_follow_document_order() {
        let blocks = synthesizer().synthesize(&Html::parse_document(TWO_TABLES));

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].table_title, "Electrical");
        assert_eq!(blocks[0].rows.len(), 2);
        assert_eq!(blocks[0].rows[0].name, "Voltage");
        assert_eq!(blocks[0].rows[0].value, "230 V");
        assert_eq!(blocks[1].table_title, "Physical");
        assert_eq!(blocks[1].rows.len(), 1);
        assert_eq!(blocks[1].rows[0].value, "1.2 kg");
    }

    #[test]
    fn test_cells_with_inline_markup_keep_their_text() {
        let html = Html::parse_document(
            r#"<div id="specsList"><table class="table">
                 <tr><th>Physical</th></tr>
                 <tr><td>Display <span>area</span></td><td>10 m<sup>2</sup></td></tr>
                 <tr><td>Weight</td><td>1.2<span>kg</span></td></tr>
               </table></div>"#,
        );

        let blocks = synthesizer().synthesize(&html);
        assert_eq!(blocks[0].rows[0].name, "Display area");
        assert_eq!(blocks[0].rows[0].value, "10 m2");
        assert_eq!(blocks[0].rows[1].value, "1.2kg");
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        let html = Html::parse_document(TWO_TABLES);
        let synthesizer = synthesizer();
        assert_eq!(synthesizer.synthesize(&html), synthesizer.synthesize(&html));
    }

    #[test]
    fn test_no_tables_yields_empty() {
        let html = Html::parse_document("<p>No specs</p>");
        assert!(synthesizer().synthesize(&html).is_empty());
        assert_eq!(render_spec_html(&[]), "");
    }

    #[test]
    fn test_legacy_html_rendering() {
        let mut block = SpecBlock::new("Physical");
        block.push_row("Weight", "1.2 kg");

        assert_eq!(
            render_spec_html(&[block]),
            "<h3>Physical</h3><table border=\"1\" style=\"border-collapse: collapse; width: 100%;\">\
             <thead><tr><th>Spec Name</th><th>Spec Value</th></tr></thead><tbody>\
             <tr><td>Weight</td><td>1.2 kg</td></tr></tbody></table><br><br>"
        );
    }
}
