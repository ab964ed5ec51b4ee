//! Catalog records produced by each crawl stage
//!
//! Records form a hierarchy (category → subcategory → product summary →
//! product detail) that is linked by name, not by reference: every child
//! carries the names of its parents from the moment it is created.
//!
//! Serialized field names follow the artifact vocabulary already consumed by
//! downstream catalog importers (`category_name`, `product_link`, ...).

use serde::{Deserialize, Serialize};

/// Top-level product category from the catalog landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "category_name")]
    pub name: String,
    #[serde(rename = "category_image")]
    pub image_url: Option<String>,
    #[serde(rename = "category_description")]
    pub description: Option<String>,
    /// Absolute URL of the category page
    #[serde(rename = "category_link")]
    pub link: String,
}

/// Subcategory discovered on a category page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryRecord {
    #[serde(rename = "subcategory_name")]
    pub name: String,
    #[serde(rename = "subcategory_image")]
    pub image_url: Option<String>,
    #[serde(rename = "subcategory_link")]
    pub link: String,
    #[serde(rename = "product_category_string")]
    pub parent_category_name: String,
}

/// Product card found on a subcategory listing page.
///
/// This is the unit checkpointed between discovery and detail extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummaryRecord {
    #[serde(rename = "product_name")]
    pub name: String,
    #[serde(rename = "product_image")]
    pub image_url: Option<String>,
    #[serde(rename = "product_short_description")]
    pub short_description: Option<String>,
    #[serde(rename = "product_link")]
    pub link: String,
    #[serde(rename = "product_category_string")]
    pub parent_category_name: String,
    #[serde(rename = "product_subcategory_string")]
    pub parent_subcategory_name: String,
}

/// One row of a specification table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRow {
    pub name: String,
    pub value: String,
}

/// A titled specification table normalized to (name, value) rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecBlock {
    pub table_title: String,
    pub rows: Vec<SpecRow>,
}

impl SpecBlock {
    pub fn new(table_title: impl Into<String>) -> Self {
        Self {
            table_title: table_title.into(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.rows.push(SpecRow {
            name: name.into(),
            value: value.into(),
        });
    }
}

/// Fully extracted product detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetailRecord {
    #[serde(rename = "product_name")]
    pub name: Option<String>,
    #[serde(rename = "product_identifier")]
    pub identifier: Option<String>,
    /// Absolute image URLs, primary image first, no duplicates
    #[serde(rename = "product_images")]
    pub images: Vec<String>,
    #[serde(rename = "product_subtitle")]
    pub subtitle: Option<String>,
    #[serde(rename = "product_description")]
    pub description: Option<String>,
    /// URL the browser ended up on after navigation
    #[serde(rename = "product_link")]
    pub canonical_link: String,
    pub specifications: Vec<SpecBlock>,
    /// HTML rendering of `specifications` kept for legacy importers
    #[serde(default)]
    pub technical_specifications: String,
    #[serde(rename = "product_category_string")]
    pub parent_category_name: String,
    #[serde(rename = "product_subcategory_string")]
    pub parent_subcategory_name: String,
}

/// A product whose detail page could not be extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    #[serde(rename = "product_name")]
    pub name: String,
    #[serde(rename = "product_link")]
    pub link: String,
    #[serde(rename = "error")]
    pub error_message: String,
}

impl FailureRecord {
    pub fn new(name: &str, link: &str, error: impl std::fmt::Display) -> Self {
        Self {
            name: name.to_string(),
            link: link.to_string(),
            error_message: error.to_string(),
        }
    }
}

/// Anything the stage runner can navigate to
pub trait LinkRecord {
    fn display_name(&self) -> &str;
    fn link(&self) -> &str;
}

impl LinkRecord for CategoryRecord {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn link(&self) -> &str {
        &self.link
    }
}

impl LinkRecord for SubcategoryRecord {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn link(&self) -> &str {
        &self.link
    }
}

impl LinkRecord for ProductSummaryRecord {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn link(&self) -> &str {
        &self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_serializes_with_artifact_keys() {
        let summary = ProductSummaryRecord {
            name: "Uni-Therm".to_string(),
            image_url: None,
            short_description: Some("Thermal analyser".to_string()),
            link: "https://www.rigelmedical.com/gb/products/uni-therm/".to_string(),
            parent_category_name: "Electrical Safety".to_string(),
            parent_subcategory_name: "Analysers".to_string(),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["product_name"], "Uni-Therm");
        assert_eq!(value["product_image"], serde_json::Value::Null);
        assert_eq!(value["product_category_string"], "Electrical Safety");
        assert_eq!(value["product_subcategory_string"], "Analysers");
    }

    #[test]
    fn test_failure_record_reads_legacy_artifact() {
        let raw = json!({
            "product_name": "Multi-Flo",
            "product_link": "https://www.rigelmedical.com/gb/products/multi-flo/",
            "error": "Navigation timeout of 60000 ms exceeded"
        });

        let record: FailureRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.name, "Multi-Flo");
        assert!(record.error_message.contains("timeout"));
    }

    #[test]
    fn test_spec_block_rows_keep_insertion_order() {
        let mut block = SpecBlock::new("Electrical");
        block.push_row("Voltage", "230 V");
        block.push_row("Frequency", "50 Hz");

        let names: Vec<_> = block.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Voltage", "Frequency"]);
    }
}
