//! Font registry: family and alias lookup, CSS generation, file access.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::font::{Font, FontFormat};
use crate::error::{Error, Result};

/// Family used when no font configuration is available.
pub const DEFAULT_FAMILY: &str = "gt-pressura";

/// Maps font families (and aliases) to font files on disk.
///
/// The registry is populated once at startup and only read afterwards, so a
/// shared reference can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    fonts: HashMap<String, Font>,
    aliases: HashMap<String, String>,
    base_dir: PathBuf,
}

impl Registry {
    /// Create an empty registry resolving relative font paths against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            fonts: HashMap::new(),
            aliases: HashMap::new(),
            base_dir: base_dir.into(),
        }
    }

    /// Registry seeded with the built-in GT Pressura family.
    pub fn default_fonts(base_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new(base_dir);

        registry.register_font(
            DEFAULT_FAMILY,
            Font::new("GT Pressura Regular")
                .with_variant(FontFormat::Ttf, "gt-pressura-regular.ttf")
                .with_variant(FontFormat::Woff, "web/gt-pressura-regular.woff")
                .with_variant(FontFormat::Woff2, "web/gt-pressura-regular.woff2"),
        );

        registry.register_alias("GT Pressura", DEFAULT_FAMILY);
        registry.register_alias("gt pressura", DEFAULT_FAMILY);
        registry.register_alias("GTpressura", DEFAULT_FAMILY);

        registry
    }

    /// Directory that relative variant paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Insert or replace a family. The font's `family` field is set to `family`.
    pub fn register_font(&mut self, family: impl Into<String>, mut font: Font) {
        let family = family.into();
        font.family = family.clone();
        self.fonts.insert(family, font);
    }

    /// Remove a family, returning it. Aliases pointing at it are kept and
    /// simply stop resolving.
    pub fn remove_font(&mut self, family: &str) -> Option<Font> {
        self.fonts.remove(family)
    }

    /// Map `alias` to `family`. The target does not have to exist yet.
    pub fn register_alias(&mut self, alias: impl Into<String>, family: impl Into<String>) {
        self.aliases.insert(alias.into(), family.into());
    }

    /// Look up a font by family name, then by alias (one hop).
    pub fn font(&self, name: &str) -> Option<&Font> {
        if let Some(font) = self.fonts.get(name) {
            return Some(font);
        }

        self.aliases
            .get(name)
            .and_then(|family| self.fonts.get(family))
    }

    /// Registered family names, sorted.
    pub fn families(&self) -> Vec<&str> {
        let mut families: Vec<&str> = self.fonts.keys().map(String::as_str).collect();
        families.sort_unstable();
        families
    }

    /// Aliases that point at `family`, sorted.
    pub fn aliases_of(&self, family: &str) -> Vec<&str> {
        let mut aliases: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == family)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// True when no family is registered.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Absolute path of one format of a family.
    pub fn font_path(&self, family: &str, format: FontFormat) -> Result<PathBuf> {
        let font = self
            .font(family)
            .ok_or_else(|| Error::FontFamilyNotFound(family.to_string()))?;

        let path = font
            .variant(format)
            .ok_or_else(|| Error::FontFormatNotFound {
                family: family.to_string(),
                format: format.to_string(),
            })?;

        Ok(self.resolve(path))
    }

    /// Read the raw bytes of one format of a family.
    pub fn load_font_data(&self, family: &str, format: FontFormat) -> Result<Vec<u8>> {
        let path = self.font_path(family, format)?;
        Ok(std::fs::read(path)?)
    }

    /// Read a font file and encode it as a `data:` URI.
    ///
    /// Relative paths are resolved against the base directory; the MIME type
    /// follows the file extension and defaults to `font/ttf`.
    pub fn data_uri(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(self.resolve(path))?;
        let mime = FontFormat::from_path(path)
            .unwrap_or(FontFormat::Ttf)
            .mime_type();
        Ok(format!("data:{mime};base64,{}", STANDARD.encode(data)))
    }

    /// `@font-face` rule pointing at the web font endpoint.
    ///
    /// Sources are listed woff2, woff, ttf, otf, skipping formats the family
    /// does not have.
    pub fn css(&self, family: &str, base_url: &str) -> Result<String> {
        let font = self
            .font(family)
            .ok_or_else(|| Error::FontFamilyNotFound(family.to_string()))?;
        Ok(web_font_face(font, &font.family, base_url, "normal", "normal"))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// URL of one font file on the font endpoint.
pub fn font_url(base_url: &str, family: &str, format: FontFormat) -> String {
    format!(
        "{}/fonts/{family}/{family}.{}",
        base_url.trim_end_matches('/'),
        format.extension()
    )
}

/// Build an `@font-face` block whose sources live on the font endpoint.
///
/// `css_family` is the name declared in the rule, which may differ from the
/// registry key when a document refers to the font by alias.
pub(crate) fn web_font_face(
    font: &Font,
    css_family: &str,
    base_url: &str,
    weight: &str,
    style: &str,
) -> String {
    let sources: Vec<String> = FontFormat::CSS_ORDER
        .iter()
        .filter(|format| font.variants.contains_key(*format))
        .map(|format| {
            format!(
                "url('{}') format('{}')",
                font_url(base_url, &font.family, *format),
                format.css_hint()
            )
        })
        .collect();

    let mut css = String::new();
    css.push_str("@font-face {\n");
    let _ = writeln!(css, "  font-family: '{css_family}';");
    css.push_str("  src: ");
    css.push_str(&sources.join(",\n       "));
    css.push_str(";\n");
    let _ = writeln!(css, "  font-weight: {weight};");
    let _ = writeln!(css, "  font-style: {style};");
    css.push_str("}\n");
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::default_fonts("/srv/fonts")
    }

    #[test]
    fn test_lookup_by_family_and_alias() {
        let reg = registry();
        assert_eq!(reg.font("gt-pressura").unwrap().family, "gt-pressura");
        assert_eq!(reg.font("GT Pressura").unwrap().family, "gt-pressura");
        assert_eq!(reg.font("GTpressura").unwrap().name, "GT Pressura Regular");
        assert!(reg.font("gt-PRESSURA").is_none());
        assert!(reg.font("Inter").is_none());
    }

    #[test]
    fn test_register_sets_family() {
        let mut reg = Registry::new("/tmp");
        reg.register_font("inter", Font::new("Inter Regular"));
        assert_eq!(reg.font("inter").unwrap().family, "inter");
    }

    #[test]
    fn test_register_overwrites() {
        let mut reg = Registry::new("/tmp");
        reg.register_font("inter", Font::new("Old"));
        reg.register_font("inter", Font::new("New"));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.font("inter").unwrap().name, "New");
    }

    #[test]
    fn test_alias_registered_before_family() {
        let mut reg = Registry::new("/tmp");
        reg.register_alias("Inter", "inter");
        assert!(reg.font("Inter").is_none());
        reg.register_font("inter", Font::new("Inter"));
        assert_eq!(reg.font("Inter").unwrap().family, "inter");
    }

    #[test]
    fn test_alias_is_single_hop() {
        let mut reg = Registry::new("/tmp");
        reg.register_font("base", Font::new("Base"));
        reg.register_alias("middle", "base");
        reg.register_alias("outer", "middle");
        assert!(reg.font("middle").is_some());
        assert!(reg.font("outer").is_none());
    }

    #[test]
    fn test_alias_does_not_fall_through_after_removal() {
        let mut reg = Registry::new("/tmp");
        reg.register_font("a", Font::new("A"));
        reg.register_font("b", Font::new("B"));
        reg.register_alias("nick", "a");
        reg.remove_font("a");
        assert!(reg.font("nick").is_none());
    }

    #[test]
    fn test_font_path() {
        let reg = registry();
        assert_eq!(
            reg.font_path("GT Pressura", FontFormat::Woff2).unwrap(),
            PathBuf::from("/srv/fonts/web/gt-pressura-regular.woff2")
        );
        assert!(matches!(
            reg.font_path("gt-pressura", FontFormat::Otf),
            Err(Error::FontFormatNotFound { .. })
        ));
        assert!(matches!(
            reg.font_path("missing", FontFormat::Ttf),
            Err(Error::FontFamilyNotFound(_))
        ));
    }

    #[test]
    fn test_font_path_absolute_variant() {
        let mut reg = Registry::new("/srv/fonts");
        reg.register_font(
            "abs",
            Font::new("Abs").with_variant(FontFormat::Otf, "/opt/fonts/abs.otf"),
        );
        assert_eq!(
            reg.font_path("abs", FontFormat::Otf).unwrap(),
            PathBuf::from("/opt/fonts/abs.otf")
        );
    }

    #[test]
    fn test_css_lists_formats_in_preference_order() {
        let css = registry().css("gt-pressura", "https://banners.example").unwrap();
        let woff2 = css.find("format('woff2')").unwrap();
        let woff = css.find("format('woff')").unwrap();
        let ttf = css.find("format('truetype')").unwrap();
        assert!(woff2 < woff && woff < ttf);
        assert!(!css.contains("opentype"));
        assert!(css.starts_with("@font-face {\n  font-family: 'gt-pressura';\n"));
        assert!(css.contains(
            "url('https://banners.example/fonts/gt-pressura/gt-pressura.woff2') format('woff2')"
        ));
        assert!(css.ends_with("  font-weight: normal;\n  font-style: normal;\n}\n"));
    }

    #[test]
    fn test_css_unknown_family() {
        assert!(matches!(
            registry().css("Comic Sans", ""),
            Err(Error::FontFamilyNotFound(name)) if name == "Comic Sans"
        ));
    }

    #[test]
    fn test_families_and_aliases() {
        let reg = registry();
        assert_eq!(reg.families(), vec!["gt-pressura"]);
        assert_eq!(
            reg.aliases_of("gt-pressura"),
            vec!["GT Pressura", "GTpressura", "gt pressura"]
        );
    }

    #[test]
    fn test_font_url_trims_trailing_slash() {
        assert_eq!(
            font_url("http://localhost:8080/", "inter", FontFormat::Woff),
            "http://localhost:8080/fonts/inter/inter.woff"
        );
    }
}
