//! Selector configuration for catalog extraction
//!
//! Every CSS selector the extractors use lives here so that a markup change
//! on the vendor site is a configuration change, not a code change.

use serde::{Deserialize, Serialize};

/// Selectors for all four hierarchy levels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub category: CategorySelectors,
    pub subcategory: SubcategorySelectors,
    pub product_list: ProductListSelectors,
    pub product_detail: ProductDetailSelectors,
}

/// Category landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorySelectors {
    pub card: String,
    pub link: String,
    pub image: String,
    pub name: String,
    pub description: String,
}

impl Default for CategorySelectors {
    fn default() -> Self {
        Self {
            card: ".industryCard".to_string(),
            link: "a".to_string(),
            image: "img".to_string(),
            name: ".card-title".to_string(),
            description: ".card-body div".to_string(),
        }
    }
}

/// Category page listing its subcategories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubcategorySelectors {
    pub card: String,
    pub link: String,
    pub image: String,
    pub name: String,
}

impl Default for SubcategorySelectors {
    fn default() -> Self {
        Self {
            card: ".row .col-12.col-sm-6.col-lg-4".to_string(),
            link: "a".to_string(),
            image: "img".to_string(),
            name: ".panel-title".to_string(),
        }
    }
}

/// Subcategory page listing product cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductListSelectors {
    pub card: String,
    pub link: String,
    pub image: String,
    pub name: String,
    pub short_description: String,
}

impl Default for ProductListSelectors {
    fn default() -> Self {
        Self {
            card: ".row.padding-top-20 .col-12.col-sm-6.col-lg-4".to_string(),
            link: "a.product-link".to_string(),
            image: ".product-box img".to_string(),
            name: ".productBoxName".to_string(),
            short_description: ".productBoxTag".to_string(),
        }
    }
}

/// Product detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDetailSelectors {
    pub name: String,
    pub subtitle: String,
    pub description: String,
    /// The product code is an unlabeled, inline-styled block under the description
    pub identifier: String,
    pub primary_image: String,
    pub preview_images: String,
    pub spec_table: String,
    pub spec_title_cell: String,
    pub spec_row: String,
    pub spec_cell: String,
}

impl Default for ProductDetailSelectors {
    fn default() -> Self {
        Self {
            name: ".productName".to_string(),
            subtitle: ".productSubtitle".to_string(),
            description: ".productDescription".to_string(),
            identifier: r#"div[style*="color:rgba(0,0,0,0.4);font-size:12px;margin-top: 50px;"]"#
                .to_string(),
            primary_image: "#zoom .productImage".to_string(),
            preview_images: ".product-image-preview img".to_string(),
            spec_table: "#specsList table.table".to_string(),
            spec_title_cell: "tr th".to_string(),
            spec_row: "tr".to_string(),
            spec_cell: "td".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_default_selectors_compile() {
        let config = SelectorConfig::default();
        let all = [
            &config.category.card,
            &config.category.description,
            &config.subcategory.card,
            &config.product_list.card,
            &config.product_list.image,
            &config.product_detail.identifier,
            &config.product_detail.primary_image,
            &config.product_detail.spec_table,
        ];

        for selector in all {
            assert!(Selector::parse(selector).is_ok(), "selector failed: {selector}");
        }
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config: SelectorConfig =
            serde_json::from_str(r#"{"category": {"card": ".segmentCard"}}"#).unwrap();
        assert_eq!(config.category.card, ".segmentCard");
        assert_eq!(config.category.name, ".card-title");
        assert_eq!(config.product_detail, ProductDetailSelectors::default());
    }
}
