//! URL and asset normalization
//!
//! The catalog serves root-relative links and thumbnail URLs carrying a
//! resize marker. Everything persisted or navigated to goes through here.

use std::collections::HashSet;
use url::Url;

use crate::infrastructure::config::rigel_medical::DISPLAY_SIZE_SUFFIX;

/// Resolve a raw `href`/`src` against the site origin.
///
/// Blank or missing input yields `None`. Input that already parses as an
/// absolute URL is returned as is (trimmed); anything else is joined onto
/// `base`.
pub fn to_absolute(base: &Url, raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if Url::parse(raw).is_ok() {
        return Some(raw.to_string());
    }

    base.join(raw).ok().map(String::from)
}

/// Remove every occurrence of the display-size marker
pub fn strip_display_suffix(url: &str) -> String {
    url.replace(DISPLAY_SIZE_SUFFIX, "")
}

/// Drop repeated entries, keeping the first occurrence of each
pub fn dedup_ordered<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// `to_absolute` followed by `strip_display_suffix`, for image sources
pub fn normalize_image(base: &Url, raw: Option<&str>) -> Option<String> {
    to_absolute(base, raw).map(|url| strip_display_suffix(&url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn base() -> Url {
        Url::parse("https://www.rigelmedical.com").unwrap()
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("   "), None)]
    #[case(Some("/gb/products/foo/"), Some("https://www.rigelmedical.com/gb/products/foo/"))]
    #[case(Some("https://cdn.example.com/a.png"), Some("https://cdn.example.com/a.png"))]
    #[case(Some("//cdn.example.com/a.png"), Some("https://cdn.example.com/a.png"))]
    #[case(Some(" /media/x.jpg "), Some("https://www.rigelmedical.com/media/x.jpg"))]
    fn test_to_absolute(#[case] raw: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(to_absolute(&base(), raw).as_deref(), expected);
    }

    #[rstest]
    #[case("https://x/img.ashx?id=1&height=500", "https://x/img.ashx?id=1")]
    #[case("https://x/a&height=500&height=500", "https://x/a")]
    #[case("https://x/a?height=500", "https://x/a?height=500")]
    #[case("https://x/a", "https://x/a")]
    fn test_strip_display_suffix(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_display_suffix(input), expected);
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let urls = ["b", "a", "b", "c", "a"].map(String::from);
        assert_eq!(dedup_ordered(urls), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_normalize_image() {
        assert_eq!(
            normalize_image(&base(), Some("/media/1.png?w=1&height=500")).as_deref(),
            Some("https://www.rigelmedical.com/media/1.png?w=1")
        );
    }

    proptest! {
        #[test]
        fn prop_dedup_has_no_duplicates_and_keeps_order(
            urls in proptest::collection::vec("[a-d]{1,2}", 0..20)
        ) {
            let deduped = dedup_ordered(urls.clone());
            let unique: HashSet<_> = deduped.iter().collect();
            prop_assert_eq!(unique.len(), deduped.len());

            // Same relative order as first occurrences in the input
            let mut expected = Vec::new();
            for url in &urls {
                if !expected.contains(url) {
                    expected.push(url.clone());
                }
            }
            prop_assert_eq!(deduped, expected);
        }

        #[test]
        fn prop_to_absolute_is_idempotent(path in "/[a-z0-9/_-]{0,30}") {
            let once = to_absolute(&base(), Some(&path));
            let twice = once.as_deref().and_then(|url| to_absolute(&base(), Some(url)));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_strip_display_suffix_removes_marker(prefix in "[a-z/?=&]{0,20}", suffix in "[a-z/]{0,10}") {
            let url = format!("{prefix}&height=500{suffix}");
            prop_assert!(!strip_display_suffix(&url).contains("&height=500"));
        }
    }
}
