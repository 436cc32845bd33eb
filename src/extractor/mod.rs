//! Page metadata extraction.
//!
//! Each field is resolved through its own fallback chain and the first
//! non-empty source wins:
//!
//! ```text
//! title       <title>                  → og:title
//! description <meta name=description>  → og:description
//! keywords    <meta name=keywords>     → []
//! ```
//!
//! Parsing is best effort. Malformed markup produces empty fields, never an
//! error.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::domain::Metadata;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector is valid"));
static META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("static selector is valid"));

#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract metadata from a fetched body.
    ///
    /// `content_type` is the response's `Content-Type` header, if any. A hint
    /// naming something other than HTML, XML or text skips parsing.
    pub fn extract(&self, body: &[u8], content_type: Option<&str>) -> Metadata {
        if let Some(content_type) = content_type {
            if !is_markup(content_type) {
                tracing::debug!("Skipping extraction for content type {}", content_type);
                return Metadata::default();
            }
        }

        let html = String::from_utf8_lossy(body);
        self.extract_html(&html)
    }

    pub fn extract_html(&self, html: &str) -> Metadata {
        let document = Html::parse_document(html);
        self.extract_document(&document)
    }

    /// Pure extraction over an already parsed document.
    pub fn extract_document(&self, document: &Html) -> Metadata {
        let title = first_title(document).or_else(|| meta_content(document, "property", "og:title"));

        let description = meta_content(document, "name", "description")
            .or_else(|| meta_content(document, "property", "og:description"));

        let keywords = meta_content(document, "name", "keywords")
            .map(|raw| split_keywords(&raw))
            .unwrap_or_default();

        Metadata {
            title,
            description,
            keywords,
        }
    }
}

fn is_markup(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.trim().is_empty()
        || content_type.contains("html")
        || content_type.contains("xml")
        || content_type.starts_with("text/")
}

fn first_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .and_then(|element| non_empty(&element.text().collect::<String>()))
}

/// Content of the first `<meta>` whose `attr` equals `key`, ignoring ASCII case.
fn meta_content(document: &Html, attr: &str, key: &str) -> Option<String> {
    document
        .select(&META)
        .filter(|element| attr_matches(element, attr, key))
        .find_map(|element| element.value().attr("content").and_then(non_empty))
}

fn attr_matches(element: &ElementRef<'_>, attr: &str, key: &str) -> bool {
    element
        .value()
        .attr(attr)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case(key))
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(String::from)
        .collect()
}

/// Collapse whitespace runs; `None` when nothing is left.
fn non_empty(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>  Example   Domain </title>
    <meta name="description" content="An example page">
    <meta name="keywords" content="rust, scraping , ,metadata,">
    <meta property="og:title" content="OG Title">
    <meta property="og:description" content="OG Description">
  </head>
  <body><p>Hello</p></body>
</html>"#;

    #[test]
    fn test_extracts_all_fields() {
        let meta = MetadataExtractor::new().extract_html(FULL_PAGE);
        assert_eq!(meta.title, Some("Example Domain".into()));
        assert_eq!(meta.description, Some("An example page".into()));
        assert_eq!(meta.keywords, vec!["rust", "scraping", "metadata"]);
    }

    #[test]
    fn test_title_falls_back_to_open_graph() {
        let html = r#"<html><head><meta property="og:title" content="Only OG"></head></html>"#;
        let meta = MetadataExtractor::new().extract_html(html);
        assert_eq!(meta.title, Some("Only OG".into()));
    }

    #[test]
    fn test_empty_title_element_falls_through() {
        let html = r#"<html><head><title>   </title><meta property="og:title" content="OG"></head></html>"#;
        let meta = MetadataExtractor::new().extract_html(html);
        assert_eq!(meta.title, Some("OG".into()));
    }

    #[test]
    fn test_description_falls_back_to_open_graph() {
        let html = r#"<html><head><meta property="og:description" content="From OG"></head></html>"#;
        let meta = MetadataExtractor::new().extract_html(html);
        assert_eq!(meta.description, Some("From OG".into()));
        assert_eq!(meta.title, None);
    }

    #[test]
    fn test_meta_name_is_case_insensitive() {
        let html = r#"<html><head><META NAME="Description" CONTENT="Shouty"></head></html>"#;
        let meta = MetadataExtractor::new().extract_html(html);
        assert_eq!(meta.description, Some("Shouty".into()));
    }

    #[test]
    fn test_missing_keywords_is_empty_not_null() {
        let meta = MetadataExtractor::new().extract_html("<html><head><title>T</title></head></html>");
        assert!(meta.keywords.is_empty());
    }

    #[test]
    fn test_malformed_markup_degrades_gracefully() {
        let extractor = MetadataExtractor::new();
        for html in ["", "<<<>>>", "<html><head><title>Unclosed", "<meta content=", "\u{0}\u{1}"] {
            let meta = extractor.extract_html(html);
            assert!(meta.description.is_none());
            assert!(meta.keywords.is_empty());
        }
        let meta = extractor.extract_html("<html><head><title>Unclosed");
        assert_eq!(meta.title, Some("Unclosed".into()));
    }

    #[test]
    fn test_entities_are_decoded() {
        let html = r#"<title>Fish &amp; Chips</title><meta name="description" content="caf&eacute;">"#;
        let meta = MetadataExtractor::new().extract_html(html);
        assert_eq!(meta.title, Some("Fish & Chips".into()));
        assert_eq!(meta.description, Some("café".into()));
    }

    #[test]
    fn test_non_markup_content_type_is_skipped() {
        let extractor = MetadataExtractor::new();
        let meta = extractor.extract(FULL_PAGE.as_bytes(), Some("image/png"));
        assert!(meta.is_empty());

        let meta = extractor.extract(FULL_PAGE.as_bytes(), Some("text/html; charset=utf-8"));
        assert_eq!(meta.title, Some("Example Domain".into()));

        let meta = extractor.extract(FULL_PAGE.as_bytes(), None);
        assert_eq!(meta.title, Some("Example Domain".into()));
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut body = b"<title>Bytes ".to_vec();
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(b"</title>");
        let meta = MetadataExtractor::new().extract(&body, Some("text/html"));
        assert!(meta.title.unwrap().starts_with("Bytes"));
    }
}
