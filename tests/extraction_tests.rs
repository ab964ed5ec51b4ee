//! Extraction through the public parser API on fixture pages
use catalog_crawler::domain::{CategoryRecord, ProductSummaryRecord, SubcategoryRecord};
use catalog_crawler::infrastructure::parsing::normalizer::{dedup_ordered, to_absolute};
use catalog_crawler::infrastructure::parsing::{
    CategoryParser, ContextualParser, ExtractContext, ProductDetailParser, ProductListParser,
    SelectorConfig, SubcategoryParser,
};
use scraper::Html;
use url::Url;

const ORIGIN: &str = "https://www.rigelmedical.com";

fn context(page: &str) -> ExtractContext {
    ExtractContext::new(ORIGIN, page).expect("valid origin")
}

#[test]
fn test_industry_card_link_resolves_against_origin() {
    let html = Html::parse_document(
        r#"<section><div class="industryCard"><a href="/gb/products/foo/"><h4 class="card-title">Foo</h4></a></div></section>"#,
    );

    let categories = CategoryParser::new()
        .unwrap()
        .parse_with_context(&html, &context(&format!("{ORIGIN}/gb/products/")), &())
        .unwrap();

    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].link, "https://www.rigelmedical.com/gb/products/foo/");
}

#[test]
fn test_hierarchy_names_flow_from_parent_records() {
    let category = CategoryRecord {
        name: "Medical Simulators".to_string(),
        image_url: None,
        description: None,
        link: format!("{ORIGIN}/gb/products/simulators/"),
    };
    let category_page = Html::parse_document(
        r#"<div class="row">
             <div class="col-12 col-sm-6 col-lg-4"><a href="/gb/products/simulators/patient/"><span class="panel-title">Patient Simulators</span></a></div>
             <div class="col-12 col-sm-6 col-lg-4"><a href="/gb/products/simulators/spo2/"><span class="panel-title">SpO2 Simulators</span></a></div>
             <div class="col-12 col-sm-6 col-lg-4"><a href="/gb/products/simulators/nibp/"><span class="panel-title">NIBP Simulators</span></a></div>
           </div>"#,
    );

    let subcategories: Vec<SubcategoryRecord> = SubcategoryParser::new(Some(2))
        .unwrap()
        .parse_with_context(&category_page, &context(&category.link), &category)
        .unwrap();
    assert_eq!(subcategories.len(), 2);

    let listing = Html::parse_document(
        r#"<div class="row padding-top-20">
             <div class="col-12 col-sm-6 col-lg-4">
               <a class="product-link" href="/gb/products/uni-sim/"><span class="productBoxName">Uni-Sim</span></a>
             </div>
           </div>"#,
    );
    let products: Vec<ProductSummaryRecord> = ProductListParser::new()
        .unwrap()
        .parse_with_context(&listing, &context(&subcategories[0].link), &subcategories[0])
        .unwrap();

    assert_eq!(products[0].parent_category_name, "Medical Simulators");
    assert_eq!(products[0].parent_subcategory_name, "Patient Simulators");
}

#[test]
fn test_detail_parser_honours_selector_overrides() {
    let mut selectors = SelectorConfig::default();
    selectors.product_detail.name = "h2.title".to_string();

    let parent = ProductSummaryRecord {
        name: "Uni-Sim".to_string(),
        image_url: None,
        short_description: None,
        link: format!("{ORIGIN}/gb/products/uni-sim/"),
        parent_category_name: "Medical Simulators".to_string(),
        parent_subcategory_name: "Patient Simulators".to_string(),
    };
    let html = Html::parse_document(r#"<h2 class="title">Uni-Sim Vital Signs Simulator</h2>"#);

    let record = ProductDetailParser::with_config(&selectors.product_detail)
        .unwrap()
        .parse_with_context(&html, &context(&parent.link), &parent)
        .unwrap();

    assert_eq!(record.name.as_deref(), Some("Uni-Sim Vital Signs Simulator"));
    assert_eq!(record.canonical_link, parent.link);
}

#[test]
fn test_normalizer_public_api() {
    let base = Url::parse(ORIGIN).unwrap();
    assert_eq!(to_absolute(&base, None), None);
    assert_eq!(
        to_absolute(&base, Some("https://example.org/x")).as_deref(),
        Some("https://example.org/x")
    );

    let urls = ["a", "b", "a"].map(String::from);
    assert_eq!(dedup_ordered(urls), vec!["a".to_string(), "b".to_string()]);
}
