//! Font discovery in rendered SVG and resolution against a [`Registry`].
//!
//! Resolution is two-phase for embedded fonts: the generated CSS carries a
//! `{{<family>FontData}}` placeholder instead of the base64 payload, and the
//! raw bytes travel alongside in [`ResolvedFonts::font_data`]. Callers
//! substitute the payload once they are ready to produce the final document
//! (see [`ResolvedFonts::embedded_css_with`]).

use std::collections::{BTreeSet, HashMap};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cssparser::{
    AtRuleParser, DeclarationParser, ParseError, Parser, ParserInput, QualifiedRuleParser,
    RuleBodyItemParser, RuleBodyParser,
};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::events::attributes::Attribute;
use tracing::{debug, warn};

use super::font::FontFormat;
use super::registry::{Registry, web_font_face};
use crate::error::{Error, Result};
use crate::util::normalize_font_name;

/// A font a document needs: family plus weight and style.
///
/// A document may need several weights of one family even if only one file
/// exists; every requirement is then served by the family's base file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontRequirement {
    pub family: String,
    pub weight: String,
    pub style: String,
}

impl FontRequirement {
    pub fn new(
        family: impl Into<String>,
        weight: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            family: family.into(),
            weight: weight.into(),
            style: style.into(),
        }
    }

    /// Template key holding this family's base64 payload.
    pub fn data_key(&self) -> String {
        data_key(&self.family)
    }
}

/// Fonts resolved for a single build.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFonts {
    pub requirements: Vec<FontRequirement>,
    /// `@font-face` rules with `{{key}}` placeholders for the payload.
    pub embedded_css: String,
    /// `@font-face` rules pointing at the font endpoint.
    pub web_css: String,
    /// Raw TTF bytes per requested family name.
    pub font_data: HashMap<String, Vec<u8>>,
}

impl ResolvedFonts {
    /// Base64 payload for every resolved family, keyed by template key.
    pub fn encoded_data(&self) -> HashMap<String, String> {
        self.font_data
            .iter()
            .map(|(family, data)| (data_key(family), STANDARD.encode(data)))
            .collect()
    }

    /// The embedded CSS with each placeholder replaced by its payload.
    ///
    /// `payloads` is keyed like [`encoded_data`](Self::encoded_data).
    pub fn embedded_css_with(&self, payloads: &HashMap<String, String>) -> String {
        let mut css = self.embedded_css.clone();
        for (key, payload) in payloads {
            css = css.replace(&placeholder(key), payload);
        }
        css
    }
}

/// Template key for a family's base64 payload (`gt_pressuraFontData`).
pub fn data_key(family: &str) -> String {
    format!("{}FontData", normalize_font_name(family))
}

/// Placeholder for `key` as it appears in generated CSS.
pub fn placeholder(key: &str) -> String {
    format!("{{{{{key}}}}}")
}

/// Extracts font requirements from SVG text and resolves them.
#[derive(Debug, Clone, Copy)]
pub struct FontResolver<'a> {
    registry: &'a Registry,
}

impl<'a> FontResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Collect the fonts referenced by `text` and `tspan` elements.
    ///
    /// `font-family`, `font-weight` and `font-style` attributes are read
    /// first, then declarations in the element's `style` attribute override
    /// them. Requirements are unique by (family, weight, style) and returned
    /// sorted.
    pub fn extract_fonts_from_svg(&self, content: &str) -> Result<Vec<FontRequirement>> {
        let mut requirements = BTreeSet::new();
        let mut reader = Reader::from_str(content);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if matches!(e.local_name().as_ref(), b"text" | b"tspan") =>
                {
                    let mut family = String::new();
                    let mut weight = String::from("normal");
                    let mut style = String::from("normal");
                    let mut inline_style = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.local_name().as_ref() {
                            b"font-family" => family = clean_font_family(&attr_value(&attr)),
                            b"font-weight" => weight = attr_value(&attr),
                            b"font-style" => style = attr_value(&attr),
                            b"style" => inline_style = Some(attr_value(&attr)),
                            _ => {}
                        }
                    }

                    if let Some(css) = inline_style {
                        for (name, value) in parse_style_attribute(&css) {
                            match name.to_ascii_lowercase().as_str() {
                                "font-family" => family = clean_font_family(&value),
                                "font-weight" => weight = value,
                                "font-style" => style = value,
                                _ => {}
                            }
                        }
                    }

                    if !family.is_empty() {
                        requirements.insert(FontRequirement {
                            family,
                            weight,
                            style,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::SvgParse(e.to_string())),
                _ => {}
            }
        }

        Ok(requirements.into_iter().collect())
    }

    /// Map requirements to registered fonts and generate their CSS.
    ///
    /// With an empty `base_url` each family's TTF bytes are loaded and the
    /// embedded CSS is produced; otherwise web CSS pointing at
    /// `{base_url}/fonts/...` is produced. Any requirement without a
    /// matching family fails the whole resolution.
    pub fn resolve_fonts(
        &self,
        requirements: &[FontRequirement],
        base_url: &str,
    ) -> Result<ResolvedFonts> {
        let mut resolved = ResolvedFonts {
            requirements: requirements.to_vec(),
            ..Default::default()
        };
        let mut embedded_styles = Vec::new();
        let mut web_styles = Vec::new();

        for req in requirements {
            let font = self
                .registry
                .font(&normalize_font_name(&req.family))
                .or_else(|| self.registry.font(&req.family))
                .ok_or_else(|| Error::FontFamilyNotFound(req.family.clone()))?;

            debug!(family = %req.family, resolved = %font.family, weight = %req.weight, "resolved font");

            if base_url.is_empty() {
                if !resolved.font_data.contains_key(&req.family) {
                    match self.registry.load_font_data(&font.family, FontFormat::Ttf) {
                        Ok(data) => {
                            resolved.font_data.insert(req.family.clone(), data);
                        }
                        Err(e @ (Error::FontFormatNotFound { .. } | Error::Io(_))) => {
                            warn!(family = %req.family, error = %e, "skipping embedded font");
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
                embedded_styles.push(embedded_font_face(req));
            } else {
                web_styles.push(web_font_face(
                    font,
                    &req.family,
                    base_url,
                    &req.weight,
                    &req.style,
                ));
            }
        }

        resolved.embedded_css = embedded_styles.join("\n");
        resolved.web_css = web_styles.join("\n");
        Ok(resolved)
    }
}

fn embedded_font_face(req: &FontRequirement) -> String {
    format!(
        "@font-face {{\n  font-family: '{}';\n  src: url('data:font/truetype;base64,{}') format('truetype');\n  font-weight: {};\n  font-style: {};\n}}",
        req.family,
        placeholder(&req.data_key()),
        req.weight,
        req.style
    )
}

fn attr_value(attr: &Attribute<'_>) -> String {
    let raw = String::from_utf8_lossy(&attr.value);
    match unescape(&raw) {
        Ok(value) => value.into_owned(),
        Err(_) => raw.into_owned(),
    }
}

/// Strip quotes and whitespace from a `font-family` value.
///
/// Only the first family of a fallback list is kept.
fn clean_font_family(value: &str) -> String {
    let first = value.split(',').next().unwrap_or_default();
    first.trim().trim_matches(|c| c == '\'' || c == '"').trim().to_string()
}

/// Parse an inline `style` attribute into (property, raw value) pairs.
fn parse_style_attribute(style: &str) -> Vec<(String, String)> {
    let mut declarations = Vec::new();
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);
    let mut decl_parser = StyleAttributeParser {
        declarations: &mut declarations,
    };

    // Malformed declarations are skipped
    RuleBodyParser::new(&mut parser, &mut decl_parser).for_each(drop);

    declarations
}

struct StyleAttributeParser<'a> {
    declarations: &'a mut Vec<(String, String)>,
}

impl<'i> AtRuleParser<'i> for StyleAttributeParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for StyleAttributeParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for StyleAttributeParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> std::result::Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        let value = input.slice_from(start).trim();
        self.declarations.push((name.to_string(), value.to_string()));
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for StyleAttributeParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}
