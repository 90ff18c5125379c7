//! Direct-mutation builder over a fixed-id SVG template.
//!
//! Recognized ids: `repo-name`, `description`, `stats-group`,
//! `stats-stars`, `stats-forks`, `stats-language`, and the style block
//! `font-css`. Any of them may be missing from a template.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, warn};

use super::{BannerData, BuildOptions, Builder, read_template};
use crate::error::Result;
use crate::fonts::{Font, FontFormat, Registry, web_font_face};
use crate::svg::Document;
use crate::util::{DESCRIPTION_WIDTH, format_count, wrap_text};

/// Id of the style block that receives font CSS.
pub const FONT_CSS_ID: &str = "font-css";

/// Fills a plain SVG template by element id.
#[derive(Debug, Clone)]
pub struct DirectBuilder {
    registry: Arc<Registry>,
    template_path: PathBuf,
    source: String,
    base_url: String,
}

impl DirectBuilder {
    /// Builder over template text. An empty `base_url` embeds font files as
    /// data URIs.
    pub fn new(registry: Arc<Registry>, source: impl Into<String>, base_url: &str) -> Self {
        Self {
            registry,
            template_path: PathBuf::new(),
            source: source.into(),
            base_url: base_url.to_string(),
        }
    }

    /// Builder over a template file.
    pub fn from_file(
        registry: Arc<Registry>,
        path: impl AsRef<Path>,
        base_url: &str,
    ) -> Result<Self> {
        let path = path.as_ref();
        let source = read_template(path)?;
        debug!(path = %path.display(), "loaded banner template");

        let mut builder = Self::new(registry, source, base_url);
        builder.template_path = path.to_path_buf();
        Ok(builder)
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// `@font-face` rules for every known family referenced in `svg`.
    ///
    /// Each rule declares the family under the name the document uses, so
    /// aliases match their text. Names differing only in ASCII case get one
    /// rule, as CSS compares family names that way. Unknown families and
    /// unreadable font files are skipped.
    pub fn font_css(&self, svg: &str) -> String {
        let mut css = String::new();
        let mut declared = HashSet::new();

        for family in referenced_families(svg) {
            if !declared.insert(family.to_ascii_lowercase()) {
                continue;
            }
            let Some(font) = self.registry.font(&family) else {
                warn!(family = %family, "skipping unknown font family");
                continue;
            };

            let rule = if self.base_url.is_empty() {
                match self.embedded_font_face(font, &family) {
                    Some(rule) => rule,
                    None => continue,
                }
            } else {
                web_font_face(font, &family, &self.base_url, "normal", "normal")
            };
            css.push_str(&rule);
            css.push('\n');
        }

        css
    }

    fn embedded_font_face(&self, font: &Font, css_family: &str) -> Option<String> {
        let path = font.preferred_path()?;
        let data_uri = match self.registry.data_uri(path) {
            Ok(uri) => uri,
            Err(e) => {
                warn!(family = %font.family, path = %path.display(), error = %e, "skipping unreadable font");
                return None;
            }
        };
        let format = FontFormat::from_path(path).unwrap_or(FontFormat::Ttf);

        Some(format!(
            "@font-face {{\n  font-family: '{css_family}';\n  src: url({data_uri}) format('{}');\n  font-weight: normal;\n  font-style: normal;\n}}",
            format.css_hint()
        ))
    }
}

impl Builder for DirectBuilder {
    fn build(&self, data: &BannerData, options: &BuildOptions) -> Result<String> {
        let mut doc = Document::new(self.source.as_str());

        optional(doc.update_text_by_id("repo-name", &data.repo_name))?;

        if data.description.is_empty() {
            optional(doc.hide_element_by_id("description"))?;
        } else {
            let lines = wrap_text(&data.description, DESCRIPTION_WIDTH);
            optional(doc.update_multiline_text("description", &lines))?;
        }

        if !options.no_stats && data.has_stats() {
            let stars = format!("⭐ {}", format_count(data.stars));
            let forks = format!("🍴 {}", format_count(data.forks));
            optional(doc.update_text_by_id("stats-stars", &stars))?;
            optional(doc.update_text_by_id("stats-forks", &forks))?;

            if data.language.is_empty() {
                optional(doc.hide_element_by_id("stats-language"))?;
            } else {
                optional(doc.update_text_by_id("stats-language", &data.language))?;
            }
        } else {
            optional(doc.hide_element_by_id("stats-group"))?;
        }

        let css = self.font_css(doc.as_str());
        optional(doc.inject_css(FONT_CSS_ID, &css))?;

        Ok(doc.into_string())
    }
}

/// Discard "element not found" so templates may omit optional elements.
fn optional(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

/// Family names in `font-family` attributes and style declarations.
fn referenced_families(svg: &str) -> BTreeSet<String> {
    static ATTR_RE: OnceLock<Regex> = OnceLock::new();
    static STYLE_RE: OnceLock<Regex> = OnceLock::new();
    let attr_re =
        ATTR_RE.get_or_init(|| Regex::new(r#"font-family="([^"]*)""#).expect("valid regex"));
    let style_re = STYLE_RE
        .get_or_init(|| Regex::new(r#"font-family:\s*'?([^'";]+)'?"#).expect("valid regex"));

    let mut families = BTreeSet::new();
    for caps in attr_re.captures_iter(svg) {
        families.insert(caps[1].to_string());
    }
    for caps in style_re.captures_iter(svg) {
        let family = caps[1].trim().trim_matches(|c| c == '"' || c == '\'');
        families.insert(family.to_string());
    }
    families
}
