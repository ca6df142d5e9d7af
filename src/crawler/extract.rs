use std::collections::HashSet;

use regex::Regex;

/// Matches anchors pointing at absolute http(s) targets. The url sits in group 1.
/// The run of non-quote characters must end on a quote; an href left open never matches.
pub const DEFAULT_LINK_PATTERN: &str = r#"(?ims)<\s*[aA]\s+[^>]*href="(https?://.[^"]*)"[^/aA]*?"#;
pub const DEFAULT_LINK_GROUP: usize = 1;

/// Pulls anchor targets out of raw html with a pattern instead of a parser.
/// Unusual markup can produce partial links or none at all.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    pattern: Regex,
    group: usize,
}

impl LinkExtractor {
    pub fn new(pattern: &str, group: usize) -> Result<Self, regex::Error> {
        Ok(Self { pattern: Regex::new(pattern)?, group })
    }

    /// Links of one page, each reported once, in the order they first appear.
    /// No state survives between calls.
    pub fn extract(&self, body: Option<&str>) -> Vec<String> {
        let Some(body) = body else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        self.pattern
            .captures_iter(body)
            .filter_map(|caps| caps.get(self.group))
            .map(|m| m.as_str())
            .filter(|link| seen.insert(*link))
            .map(str::to_string)
            .collect()
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_PATTERN, DEFAULT_LINK_GROUP).expect("built-in link pattern is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_body_yields_nothing() {
        assert!(LinkExtractor::default().extract(None).is_empty());
    }

    #[test]
    fn duplicates_collapse_and_order_is_kept() {
        let body = r#"<a href="http://x.com/a">1</a><a href="http://x.com/a">2</a><a href="http://y.com">3</a>"#;
        let links = LinkExtractor::default().extract(Some(body));
        assert_eq!(links, vec!["http://x.com/a".to_string(), "http://y.com".to_string()]);
    }

    #[test]
    fn relative_and_non_http_targets_are_ignored() {
        let body = r#"
            <a href="/relative">r</a>
            <a href="mailto:someone@example.com">m</a>
            <a href="ftp://files.example.com">f</a>
            <a href="https://secure.example.com/page?q=1">s</a>
        "#;
        let links = LinkExtractor::default().extract(Some(body));
        assert_eq!(links, vec!["https://secure.example.com/page?q=1".to_string()]);
    }

    #[test]
    fn tags_and_attributes_are_matched_case_insensitively() {
        let body = "<A class=\"nav\"\n   HREF=\"HTTP://Upper.example.com/X\">up</A>";
        let links = LinkExtractor::default().extract(Some(body));
        assert_eq!(links, vec!["HTTP://Upper.example.com/X".to_string()]);
    }

    #[test]
    fn unterminated_href_at_end_of_body_yields_nothing() {
        let extractor = LinkExtractor::default();
        assert!(extractor.extract(Some(r#"<a href="http://x.com/abc"#)).is_empty());
        let body = r#"<a href="http://ok.example.com">ok</a><a href="http://x.com/abc"#;
        assert_eq!(extractor.extract(Some(body)), vec!["http://ok.example.com".to_string()]);
    }

    #[test]
    fn non_anchor_tags_are_skipped() {
        let body = r#"<link href="http://style.example.com/site.css"><img src="http://img.example.com/a.png">"#;
        assert!(LinkExtractor::default().extract(Some(body)).is_empty());
    }

    #[test]
    fn same_link_on_two_pages_is_reported_twice() {
        let extractor = LinkExtractor::default();
        let page = r#"<a href="http://shared.example.com">s</a>"#;
        assert_eq!(extractor.extract(Some(page)), extractor.extract(Some(page)));
    }

    #[test]
    fn custom_pattern_and_group_are_honoured() {
        let extractor = LinkExtractor::new(r#"data-url='(https?://[^']*)'"#, 1).unwrap();
        let links = extractor.extract(Some("<div data-url='https://a.example.com'></div>"));
        assert_eq!(links, vec!["https://a.example.com".to_string()]);
    }

    #[test]
    fn missing_group_produces_no_links() {
        let extractor = LinkExtractor::new(r#"href="https?://[^"]*""#, 3).unwrap();
        assert!(extractor.extract(Some(r#"<a href="http://x.com">x</a>"#)).is_empty());
    }
}
