//! Plain-text normalization of email bodies.
//!
//! Bodies that look like an HTML document are rendered to text: markup is
//! dropped, entities are decoded by the HTML parser, whitespace inside
//! text runs collapses to single spaces, and block-level elements and `<br>`
//! start new lines so that line-oriented template patterns keep working.
//! Anything else passes through untouched.

use std::borrow::Cow;

use scraper::{ElementRef, Html, Node};
use tracing::debug;

use super::Result;
use crate::error::ExtractionError;
use crate::models::config::NormalizerConfig;

/// Elements whose content never reaches the text.
const SKIPPED: &[&str] = &["head", "script", "style", "template", "title"];

/// Elements rendered on lines of their own.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "dd", "div", "dl", "dt",
    "fieldset", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td",
    "tfoot", "th", "thead", "tr", "ul",
];

/// Converts email bodies to plain text.
#[derive(Debug, Clone)]
pub struct Normalizer {
    html_marker: String,
    max_markup_bytes: usize,
    max_depth: usize,
}

impl Normalizer {
    /// Create a normalizer with default settings.
    pub fn new() -> Self {
        Self::from_config(&NormalizerConfig::default())
    }

    pub fn from_config(config: &NormalizerConfig) -> Self {
        Self {
            html_marker: config.html_marker.clone(),
            max_markup_bytes: config.max_markup_bytes,
            max_depth: config.max_depth,
        }
    }

    /// Set the substring that marks a body as HTML.
    pub fn with_html_marker(mut self, marker: impl Into<String>) -> Self {
        self.html_marker = marker.into();
        self
    }

    /// Set the largest HTML body that will be converted.
    pub fn with_max_markup_bytes(mut self, max: usize) -> Self {
        self.max_markup_bytes = max;
        self
    }

    /// Set the deepest element nesting that will be followed.
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Whether `text` will be treated as HTML.
    pub fn is_markup(&self, text: &str) -> bool {
        !self.html_marker.is_empty() && text.contains(self.html_marker.as_str())
    }

    /// Normalize an email body to plain text.
    ///
    /// Non-HTML input is returned borrowed and unchanged. HTML conversion
    /// failures are fatal; the raw markup is never returned in their place.
    pub fn normalize<'a>(&self, text: &'a str) -> Result<Cow<'a, str>> {
        if !self.is_markup(text) {
            return Ok(Cow::Borrowed(text));
        }

        if text.len() > self.max_markup_bytes {
            return Err(ExtractionError::MarkupConversionFailed {
                reason: format!(
                    "document is {} bytes, limit is {}",
                    text.len(),
                    self.max_markup_bytes
                ),
            });
        }

        let document = Html::parse_document(text);
        let mut renderer = TextRenderer::new(self.max_depth);
        renderer.element(document.root_element(), 0)?;
        let rendered = renderer.finish();

        debug!(
            "Converted {} bytes of HTML to {} bytes of text",
            text.len(),
            rendered.len()
        );
        Ok(Cow::Owned(rendered))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with default settings.
pub fn normalize(text: &str) -> Result<Cow<'_, str>> {
    Normalizer::new().normalize(text)
}

struct TextRenderer {
    out: String,
    max_depth: usize,
    pending_space: bool,
}

impl TextRenderer {
    fn new(max_depth: usize) -> Self {
        Self {
            out: String::new(),
            max_depth,
            pending_space: false,
        }
    }

    fn element(&mut self, element: ElementRef<'_>, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(ExtractionError::MarkupConversionFailed {
                reason: format!("elements nested deeper than {}", self.max_depth),
            });
        }

        let name = element.value().name();
        if SKIPPED.contains(&name) {
            return Ok(());
        }
        if name == "br" {
            self.newline();
            return Ok(());
        }

        let block = BLOCK.contains(&name);
        if block {
            self.block_break();
        }

        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child, depth + 1)?;
                    }
                }
                _ => {}
            }
        }

        if block {
            self.block_break();
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            if self.pending_space && !self.at_line_start() {
                self.out.push(' ');
            }
            self.pending_space = false;
            self.out.push(c);
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.pending_space = false;
    }

    fn block_break(&mut self) {
        if !self.at_line_start() {
            self.newline();
        }
        self.pending_space = false;
    }

    fn finish(mut self) -> String {
        let len = self.out.trim_end().len();
        self.out.truncate(len);
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_unchanged() {
        let text = "Date: October 13, 2020\nWhere:  LARGE.COM PROVIDER\r\n";
        let normalized = normalize(text).unwrap();
        assert!(matches!(normalized, Cow::Borrowed(_)));
        assert_eq!(normalized, text);
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let text = "<HTML><BODY>hi</BODY></HTML>";
        assert_eq!(normalize(text).unwrap(), text);
    }

    #[test]
    fn test_blocks_and_breaks_become_lines() {
        let html = "<html><body><p>Merchant</p><div>I AM A LARGE  <b>#MERCHANT</b></div>\
                    Date<br>10/14/2020<br/>Time</body></html>";
        assert_eq!(
            normalize(html).unwrap(),
            "Merchant\nI AM A LARGE #MERCHANT\nDate\n10/14/2020\nTime\n"
        );
    }

    #[test]
    fn test_table_cells_on_own_lines() {
        let html = "<html><body><table><tr><td>Merchant</td></tr>\
                    <tr><td>SHOP</td><td>Date</td></tr></table></body></html>";
        assert_eq!(normalize(html).unwrap(), "Merchant\nSHOP\nDate\n");
    }

    #[test]
    fn test_entities_are_decoded() {
        let html = "<html><body><p>A&nbsp;$12.34 transaction &amp; more &#35;1</p></body></html>";
        assert_eq!(normalize(html).unwrap(), "A $12.34 transaction & more #1\n");
    }

    #[test]
    fn test_head_script_and_style_are_dropped() {
        let html = "<html><head><title>Alert</title><style>p { color: red }</style></head>\
                    <body><script>var x = 1;</script><p>visible</p></body></html>";
        assert_eq!(normalize(html).unwrap(), "visible\n");
    }

    #[test]
    fn test_too_deep_fails() {
        let mut html = String::from("<html><body>");
        for _ in 0..20 {
            html.push_str("<div>");
        }
        html.push_str("deep");
        for _ in 0..20 {
            html.push_str("</div>");
        }
        html.push_str("</body></html>");

        let err = Normalizer::new().with_max_depth(8).normalize(&html).unwrap_err();
        assert!(matches!(err, ExtractionError::MarkupConversionFailed { .. }));

        assert_eq!(Normalizer::new().normalize(&html).unwrap(), "deep\n");
    }

    #[test]
    fn test_too_large_fails() {
        let html = "<html><body>hello</body></html>";
        let err = Normalizer::new()
            .with_max_markup_bytes(10)
            .normalize(html)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MarkupConversionFailed { .. }));
    }

    #[test]
    fn test_custom_marker() {
        let normalizer = Normalizer::new().with_html_marker("<!DOCTYPE");
        let html = "<!DOCTYPE html><body><p>one</p><p>two</p></body>";
        assert_eq!(normalizer.normalize(html).unwrap(), "one\ntwo\n");
        assert!(!normalizer.is_markup("<html><body>x</body></html>"));
    }
}
