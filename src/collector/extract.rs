//! Candidate extraction from parsed page markup.
//!
//! Extraction walks every element of the document in document order and
//! applies each [`ExtractionRule`] to it. Rules are pure functions from an
//! element to zero or more raw candidate strings; they do no resolution or
//! validation.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::trace;

/// `url(...)` references in inline styles: double-quoted, single-quoted, or bare.
#[allow(clippy::expect_used)]
static STYLE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)]*?))\s*\)"#)
        .expect("style url regex is valid") // Static pattern, safe to panic
});

/// A single extraction rule applied to every element.
pub trait ExtractionRule: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Returns raw candidate strings found on `element`, in attribute order.
    fn extract(&self, element: ElementRef<'_>) -> Vec<String>;
}

/// `<img src="...">`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImgSrcRule;

impl ExtractionRule for ImgSrcRule {
    fn name(&self) -> &'static str {
        "img-src"
    }

    fn extract(&self, element: ElementRef<'_>) -> Vec<String> {
        if !is_img(element) {
            return Vec::new();
        }
        element
            .value()
            .attr("src")
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(|src| vec![src.to_string()])
            .unwrap_or_default()
    }
}

/// `<img srcset="a.jpg 1x, b.jpg 2x">`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImgSrcsetRule;

impl ExtractionRule for ImgSrcsetRule {
    fn name(&self) -> &'static str {
        "img-srcset"
    }

    fn extract(&self, element: ElementRef<'_>) -> Vec<String> {
        if !is_img(element) {
            return Vec::new();
        }
        element
            .value()
            .attr("srcset")
            .map(parse_srcset)
            .unwrap_or_default()
    }
}

/// `style="background-image: url('...')"` on any element.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyleUrlRule;

impl ExtractionRule for InlineStyleUrlRule {
    fn name(&self) -> &'static str {
        "inline-style"
    }

    fn extract(&self, element: ElementRef<'_>) -> Vec<String> {
        element
            .value()
            .attr("style")
            .map(parse_style_urls)
            .unwrap_or_default()
    }
}

/// Rules applied by [`extract_candidates`].
pub static DEFAULT_RULES: [&dyn ExtractionRule; 3] =
    [&ImgSrcRule, &ImgSrcsetRule, &InlineStyleUrlRule];

/// Parses `html` and returns raw candidates from the default rules.
///
/// Parsing is best-effort: malformed markup yields whatever elements the
/// parser could recover, never an error.
///
/// # Examples
///
/// ```
/// use bulk_image_downloader::collector::extract_candidates;
///
/// let html = r#"<img src="/a.png" srcset="/b.jpg 1x, /c.jpg 2x">"#;
/// assert_eq!(extract_candidates(html), vec!["/a.png", "/b.jpg", "/c.jpg"]);
/// ```
#[must_use]
pub fn extract_candidates(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    extract_with_rules(&document, &DEFAULT_RULES)
}

/// Visits every element in document order and collects the output of `rules`.
#[must_use]
pub fn extract_with_rules(document: &Html, rules: &[&dyn ExtractionRule]) -> Vec<String> {
    let mut candidates = Vec::new();
    for element in document.tree.root().descendants().filter_map(ElementRef::wrap) {
        for rule in rules {
            let found = rule.extract(element);
            if !found.is_empty() {
                trace!(rule = rule.name(), count = found.len(), "extraction rule matched");
                candidates.extend(found);
            }
        }
    }
    candidates
}

/// Splits a `srcset` value into its URL tokens, discarding descriptors.
#[must_use]
pub fn parse_srcset(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Returns every `url(...)` reference inside a style declaration.
#[must_use]
pub fn parse_style_urls(style: &str) -> Vec<String> {
    STYLE_URL_PATTERN
        .captures_iter(style)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_img(element: ElementRef<'_>) -> bool {
    element.value().name().eq_ignore_ascii_case("img")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AnchorHrefRule;

    impl ExtractionRule for AnchorHrefRule {
        fn name(&self) -> &'static str {
            "anchor-href"
        }

        fn extract(&self, element: ElementRef<'_>) -> Vec<String> {
            element
                .value()
                .attr("href")
                .filter(|_| element.value().name() == "a")
                .map(|href| vec![href.to_string()])
                .unwrap_or_default()
        }
    }

    #[test]
    fn test_default_rule_names_are_distinct() {
        let names: Vec<_> = DEFAULT_RULES.iter().map(|rule| rule.name()).collect();
        assert_eq!(names, vec!["img-src", "img-srcset", "inline-style"]);
    }

    #[test]
    fn test_extract_with_user_defined_rule() {
        let document = Html::parse_document(r#"<a href="/x.png"><img src="/y.png"></a>"#);
        let rules: [&dyn ExtractionRule; 2] = [&AnchorHrefRule, &ImgSrcRule];
        assert_eq!(extract_with_rules(&document, &rules), vec!["/x.png", "/y.png"]);
    }

    #[test]
    fn test_parse_srcset_discards_descriptors() {
        assert_eq!(
            parse_srcset("/b.jpg 1x, /c.jpg 2x"),
            vec!["/b.jpg", "/c.jpg"]
        );
        assert_eq!(
            parse_srcset("small.png 480w,\n  large.png 1080w"),
            vec!["small.png", "large.png"]
        );
    }

    #[test]
    fn test_parse_srcset_skips_empty_entries() {
        assert_eq!(parse_srcset(" , /only.png ,"), vec!["/only.png"]);
        assert!(parse_srcset("").is_empty());
    }

    #[test]
    fn test_parse_style_urls_quoted_and_bare() {
        assert_eq!(
            parse_style_urls("background-image:url('/d.png')"),
            vec!["/d.png"]
        );
        assert_eq!(
            parse_style_urls(r#"background: URL("/e.jpg") no-repeat"#),
            vec!["/e.jpg"]
        );
        assert_eq!(
            parse_style_urls("background-image: url( /f.gif )"),
            vec!["/f.gif"]
        );
    }

    #[test]
    fn test_parse_style_urls_multiple_layers() {
        assert_eq!(
            parse_style_urls("background-image: url(a.png), url(\"b.png\")"),
            vec!["a.png", "b.png"]
        );
    }

    #[test]
    fn test_parse_style_urls_ignores_plain_styles() {
        assert!(parse_style_urls("color: red; margin: 0").is_empty());
        assert!(parse_style_urls("background: url('')").is_empty());
    }

    #[test]
    fn test_extract_candidates_three_sources_in_document_order() {
        let html = r#"
            <html><body>
              <img src="/a.png">
              <img srcset="/b.jpg 1x, /c.jpg 2x">
              <div style="background-image:url('/d.png')"></div>
            </body></html>
        "#;
        assert_eq!(
            extract_candidates(html),
            vec!["/a.png", "/b.jpg", "/c.jpg", "/d.png"]
        );
    }

    #[test]
    fn test_extract_candidates_src_before_srcset_on_same_element() {
        let html = r#"<img srcset="/big.png 2x" src="/small.png">"#;
        assert_eq!(extract_candidates(html), vec!["/small.png", "/big.png"]);
    }

    #[test]
    fn test_extract_candidates_ignores_src_on_non_img() {
        let html = r#"<script src="/app.js"></script><iframe src="/frame"></iframe>"#;
        assert!(extract_candidates(html).is_empty());
    }

    #[test]
    fn test_extract_candidates_tolerates_malformed_markup() {
        let html = r#"<div><img src="/ok.png"<p>unclosed <img src='/two.gif'>"#;
        let found = extract_candidates(html);
        assert!(found.contains(&"/two.gif".to_string()), "found: {found:?}");
    }

    #[test]
    fn test_extract_candidates_empty_document() {
        assert!(extract_candidates("").is_empty());
        assert!(extract_candidates("<html></html>").is_empty());
    }

    #[test]
    fn test_extract_with_custom_rule_set() {
        let document = Html::parse_document(
            r#"<img src="/a.png" srcset="/b.png 2x"><p style="background:url(/c.png)"></p>"#,
        );
        let only_styles: [&dyn ExtractionRule; 1] = [&InlineStyleUrlRule];
        assert_eq!(extract_with_rules(&document, &only_styles), vec!["/c.png"]);
    }
}
