//! Font families and their encoded file variants.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Encoded font file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontFormat {
    Ttf,
    Woff,
    Woff2,
    Otf,
    /// Served when registered, never referenced from generated CSS.
    Eot,
}

impl FontFormat {
    /// Order in which `@font-face` sources are listed.
    pub const CSS_ORDER: [FontFormat; 4] = [
        FontFormat::Woff2,
        FontFormat::Woff,
        FontFormat::Ttf,
        FontFormat::Otf,
    ];

    /// Order in which a single file is picked when only one can be used.
    pub const FILE_PREFERENCE: [FontFormat; 4] = [
        FontFormat::Woff,
        FontFormat::Woff2,
        FontFormat::Ttf,
        FontFormat::Otf,
    ];

    /// File extension / config tag, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            FontFormat::Ttf => "ttf",
            FontFormat::Woff => "woff",
            FontFormat::Woff2 => "woff2",
            FontFormat::Otf => "otf",
            FontFormat::Eot => "eot",
        }
    }

    /// Value for the CSS `format()` hint.
    pub fn css_hint(self) -> &'static str {
        match self {
            FontFormat::Ttf => "truetype",
            FontFormat::Otf => "opentype",
            FontFormat::Eot => "embedded-opentype",
            other => other.extension(),
        }
    }

    /// MIME type used for HTTP responses and data URIs.
    pub fn mime_type(self) -> &'static str {
        match self {
            FontFormat::Ttf => "font/ttf",
            FontFormat::Woff => "font/woff",
            FontFormat::Woff2 => "font/woff2",
            FontFormat::Otf => "font/otf",
            FontFormat::Eot => "application/vnd.ms-fontobject",
        }
    }

    /// Parse a bare extension tag (`"woff2"`, `"TTF"`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ttf" => Some(FontFormat::Ttf),
            "woff" => Some(FontFormat::Woff),
            "woff2" => Some(FontFormat::Woff2),
            "otf" => Some(FontFormat::Otf),
            "eot" => Some(FontFormat::Eot),
            _ => None,
        }
    }

    /// Infer the format from a file name or path.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FontFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| format!("unknown font format: {s}"))
    }
}

/// A registered font family.
///
/// Variants may be partial; paths are relative to the registry's base
/// directory unless absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Font {
    /// Human-readable name (e.g., "GT Pressura Regular").
    pub name: String,
    /// CSS family identifier; also the registry key.
    pub family: String,
    /// File path for each available format.
    pub variants: BTreeMap<FontFormat, PathBuf>,
}

impl Font {
    /// Create a font with no variants. The family is set on registration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a file variant.
    pub fn with_variant(mut self, format: FontFormat, path: impl Into<PathBuf>) -> Self {
        self.variants.insert(format, path.into());
        self
    }

    /// Path registered for `format`, if any.
    pub fn variant(&self, format: FontFormat) -> Option<&Path> {
        self.variants.get(&format).map(PathBuf::as_path)
    }

    /// First available file, preferring woff.
    pub fn preferred_path(&self) -> Option<&Path> {
        FontFormat::FILE_PREFERENCE
            .iter()
            .find_map(|format| self.variant(*format))
    }
}
