//! Mutable SVG text buffer addressed by element id.
//!
//! Every mutator searches the buffer with a regular expression built for the
//! target id. Only the first matching element is touched, except
//! [`Document::hide_element_by_id`] which marks every element carrying the id.
//! Templates should not rely on duplicate ids: which copy gets mutated
//! follows document order and is not a contract.

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::escape::escape_xml;
use crate::error::{Error, Result};

/// An SVG document held as a single string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
}

impl Document {
    /// Create a document from SVG text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Current document text.
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Consume the document, returning its text.
    pub fn into_string(self) -> String {
        self.content
    }

    /// Replace the content of `<text id="...">` with a single `<tspan>`.
    ///
    /// The body capture is non-greedy and may span lines, so nested tspans
    /// are discarded along with plain text.
    pub fn update_text_by_id(&mut self, id: &str, text: &str) -> Result<()> {
        let re = id_regex(r#"(?s)(<text[^>]*\sid="{id}"[^>]*>).*?(</text>)"#, id)?;
        if !re.is_match(&self.content) {
            return Err(Error::ElementNotFound(id.to_string()));
        }

        let escaped = escape_xml(text);
        let updated = re.replacen(&self.content, 1, |caps: &Captures| {
            format!("{}<tspan>{}</tspan>{}", &caps[1], escaped, &caps[2])
        });
        self.content = updated.into_owned();
        Ok(())
    }

    /// Replace a text element's content with one `<tspan>` per line.
    ///
    /// Each tspan reuses the element's `x` coordinate (`"0"` when absent);
    /// the first line sits at `dy="0"`, following lines at `dy="1.2em"`.
    /// The opening tag keeps all of its original attributes.
    pub fn update_multiline_text<S: AsRef<str>>(&mut self, id: &str, lines: &[S]) -> Result<()> {
        let re = id_regex(r#"(?s)<text([^>]*\sid="{id}"[^>]*)>.*?</text>"#, id)?;
        if !re.is_match(&self.content) {
            return Err(Error::ElementNotFound(id.to_string()));
        }

        let updated = re.replacen(&self.content, 1, |caps: &Captures| {
            let attrs = &caps[1];
            let x = x_attr_regex()
                .captures(attrs)
                .and_then(|c| c.get(1))
                .map_or("0", |m| m.as_str());

            let mut element = format!("<text{attrs}>");
            for (i, line) in lines.iter().enumerate() {
                let dy = if i == 0 { "0" } else { "1.2em" };
                element.push_str(&format!(
                    r#"<tspan x="{x}" dy="{dy}">{}</tspan>"#,
                    escape_xml(line.as_ref())
                ));
            }
            element.push_str("</text>");
            element
        });
        self.content = updated.into_owned();
        Ok(())
    }

    /// Add `visibility="hidden"` to the opening tag of every element with `id`.
    ///
    /// Tags that are already hidden are left alone, so hiding twice has the
    /// same effect as hiding once. Self-closing tags stay self-closing.
    pub fn hide_element_by_id(&mut self, id: &str) -> Result<()> {
        let re = id_regex(r#"(<[^<>]+?\sid="{id}"[^<>]*?)(/?)>"#, id)?;
        if !re.is_match(&self.content) {
            return Err(Error::ElementNotFound(id.to_string()));
        }

        let updated = re.replace_all(&self.content, |caps: &Captures| {
            if caps[1].contains(r#"visibility="hidden""#) {
                caps[0].to_string()
            } else {
                format!(r#"{} visibility="hidden"{}>"#, &caps[1], &caps[2])
            }
        });
        self.content = updated.into_owned();
        Ok(())
    }

    /// Append CSS to the `<style id="...">` block.
    ///
    /// Without a style element carrying `style_id`, the CSS goes into the
    /// first `<style>` block of the document instead. Only a document with
    /// no style block at all is an error.
    pub fn inject_css(&mut self, style_id: &str, css: &str) -> Result<()> {
        let by_id = id_regex(
            r#"(?s)(<style[^>]*\sid="{id}"[^>]*>)(.*?)(</style>)"#,
            style_id,
        )?;
        let re = if by_id.is_match(&self.content) {
            by_id
        } else {
            let any = any_style_regex();
            if !any.is_match(&self.content) {
                return Err(Error::StyleBlockMissing);
            }
            any.clone()
        };

        let updated = re.replacen(&self.content, 1, |caps: &Captures| {
            format!("{}{}\n{}{}", &caps[1], &caps[2], css, &caps[3])
        });
        self.content = updated.into_owned();
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

impl From<String> for Document {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

/// Build a regex from a pattern with an `{id}` slot, escaping the id.
fn id_regex(pattern: &str, id: &str) -> Result<Regex> {
    let pat = pattern.replace("{id}", &regex::escape(id));
    Regex::new(&pat).map_err(|e| Error::SvgParse(e.to_string()))
}

fn x_attr_regex() -> &'static Regex {
    static X_ATTR_RE: OnceLock<Regex> = OnceLock::new();
    X_ATTR_RE.get_or_init(|| Regex::new(r#"(?:^|\s)x="([^"]*)""#).expect("valid regex"))
}

fn any_style_regex() -> &'static Regex {
    static STYLE_RE: OnceLock<Regex> = OnceLock::new();
    STYLE_RE.get_or_init(|| Regex::new(r"(?s)(<style[^>]*>)(.*?)(</style>)").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLES: &str = r#"<svg>
        <text id="title" x="10" y="20">Old Title</text>
        <text id="subtitle">Old Subtitle</text>
    </svg>"#;

    #[test]
    fn test_update_text_by_id() {
        let mut doc = Document::new(TITLES);
        doc.update_text_by_id("title", "New Title").unwrap();

        let result = doc.as_str();
        assert!(result.contains(r#"<text id="title" x="10" y="20"><tspan>New Title</tspan></text>"#));
        assert!(!result.contains("Old Title"));
        assert!(result.contains("Old Subtitle"));
    }

    #[test]
    fn test_update_text_replaces_nested_content() {
        let mut doc = Document::new(
            "<svg><text id=\"title\">\n  <tspan>a</tspan>\n  <tspan>b</tspan>\n</text></svg>",
        );
        doc.update_text_by_id("title", "New").unwrap();
        assert_eq!(doc.as_str(), r#"<svg><text id="title"><tspan>New</tspan></text></svg>"#);
    }

    #[test]
    fn test_update_text_escapes_content() {
        let mut doc = Document::new(TITLES);
        doc.update_text_by_id("title", "<script> & \"friends\"").unwrap();
        assert!(doc.as_str().contains("&lt;script&gt; &amp; &quot;friends&quot;"));
    }

    #[test]
    fn test_update_text_dollar_signs_are_literal() {
        let mut doc = Document::new(TITLES);
        doc.update_text_by_id("title", "$1 and ${2}").unwrap();
        assert!(doc.as_str().contains("<tspan>$1 and ${2}</tspan>"));
    }

    #[test]
    fn test_update_text_missing_id() {
        let mut doc = Document::new(TITLES);
        let err = doc.update_text_by_id("missing", "x").unwrap_err();
        assert!(matches!(err, Error::ElementNotFound(ref id) if id == "missing"));
        assert_eq!(doc.as_str(), TITLES);
    }

    #[test]
    fn test_update_text_id_prefix_does_not_match() {
        let mut doc = Document::new(TITLES);
        assert!(doc.update_text_by_id("sub", "x").is_err());
    }

    #[test]
    fn test_update_text_only_first_duplicate() {
        let mut doc = Document::new(r#"<text id="d">one</text><text id="d">two</text>"#);
        doc.update_text_by_id("d", "new").unwrap();
        assert_eq!(doc.as_str(), r#"<text id="d"><tspan>new</tspan></text><text id="d">two</text>"#);
    }

    #[test]
    fn test_update_multiline_text() {
        let mut doc = Document::new(
            r#"<svg>
        <text id="description" x="50" y="100">
            <tspan>Old line 1</tspan>
            <tspan>Old line 2</tspan>
        </text>
    </svg>"#,
        );
        doc.update_multiline_text("description", &["New line 1", "New line 2", "New line 3"])
            .unwrap();

        let result = doc.as_str();
        assert!(result.contains(
            r#"<text id="description" x="50" y="100"><tspan x="50" dy="0">New line 1</tspan><tspan x="50" dy="1.2em">New line 2</tspan><tspan x="50" dy="1.2em">New line 3</tspan></text>"#
        ));
        assert!(!result.contains("Old line"));
    }

    #[test]
    fn test_update_multiline_text_default_x() {
        let mut doc = Document::new(r#"<text id="description" y="5">old</text>"#);
        doc.update_multiline_text("description", &["L1", "L2"]).unwrap();
        assert_eq!(
            doc.as_str(),
            r#"<text id="description" y="5"><tspan x="0" dy="0">L1</tspan><tspan x="0" dy="1.2em">L2</tspan></text>"#
        );
    }

    #[test]
    fn test_update_multiline_ignores_dx_and_tspan_x() {
        let mut doc = Document::new(
            r#"<text id="description" dx="7"><tspan x="99">old</tspan></text>"#,
        );
        doc.update_multiline_text("description", &["L1"]).unwrap();
        assert!(doc.as_str().contains(r#"<tspan x="0" dy="0">L1</tspan>"#));
    }

    #[test]
    fn test_update_multiline_missing_id() {
        let mut doc = Document::new(TITLES);
        assert!(matches!(
            doc.update_multiline_text("description", &["x"]),
            Err(Error::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_hide_element_by_id() {
        let mut doc = Document::new(
            r#"<svg>
        <g id="stats-group">
            <text>Some stats</text>
        </g>
    </svg>"#,
        );
        doc.hide_element_by_id("stats-group").unwrap();
        assert!(doc.as_str().contains(r#"<g id="stats-group" visibility="hidden">"#));
    }

    #[test]
    fn test_hide_is_idempotent() {
        let mut doc = Document::new(r#"<g id="stats-group"><text>x</text></g>"#);
        doc.hide_element_by_id("stats-group").unwrap();
        doc.hide_element_by_id("stats-group").unwrap();
        assert_eq!(doc.as_str().matches(r#"visibility="hidden""#).count(), 1);
    }

    #[test]
    fn test_hide_self_closing_element() {
        let mut doc = Document::new(r#"<svg><rect id="badge" width="4"/></svg>"#);
        doc.hide_element_by_id("badge").unwrap();
        assert_eq!(
            doc.as_str(),
            r#"<svg><rect id="badge" width="4" visibility="hidden"/></svg>"#
        );
    }

    #[test]
    fn test_hide_missing_id() {
        let mut doc = Document::new("<svg></svg>");
        assert!(doc.hide_element_by_id("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_inject_css_by_id() {
        let mut doc = Document::new(
            r#"<svg><style>.a{}</style><style id="font-css">Y</style></svg>"#,
        );
        doc.inject_css("font-css", "X").unwrap();
        assert_eq!(
            doc.as_str(),
            "<svg><style>.a{}</style><style id=\"font-css\">Y\nX</style></svg>"
        );
    }

    #[test]
    fn test_inject_css_falls_back_to_first_style() {
        let mut doc = Document::new(r#"<svg><style>Y</style><style>Z</style></svg>"#);
        doc.inject_css("font-css", "X").unwrap();
        assert_eq!(doc.as_str(), "<svg><style>Y\nX</style><style>Z</style></svg>");
    }

    #[test]
    fn test_inject_css_without_style_block() {
        let mut doc = Document::new("<svg></svg>");
        assert!(matches!(
            doc.inject_css("font-css", "X"),
            Err(Error::StyleBlockMissing)
        ));
    }

    #[test]
    fn test_display_is_verbatim() {
        let doc = Document::new(TITLES);
        assert_eq!(doc.to_string(), TITLES);
        assert_eq!(doc.into_string(), TITLES);
    }
}
