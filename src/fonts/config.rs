//! `fonts.toml` parsing.
//!
//! ```toml
//! [[fonts]]
//! family = "gt-pressura"
//! name = "GT Pressura Regular"
//! aliases = ["GT Pressura", "gt pressura"]
//!
//! [fonts.variants]
//! ttf = "gt-pressura-regular.ttf"
//! woff2 = "web/gt-pressura-regular.woff2"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::font::{Font, FontFormat};
use super::registry::Registry;
use crate::error::{Error, Result};

/// File name looked up inside the fonts directory.
pub const FONTS_TOML: &str = "fonts.toml";

/// Contents of a `fonts.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontsFile {
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
}

/// One `[[fonts]]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontEntry {
    pub family: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Format tag (`ttf`, `woff`, `woff2`, `otf`, `eot`) to file path.
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
}

impl FontsFile {
    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("failed to load font config: {e}")))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Build a registry from these entries.
    ///
    /// Variant tags that are not a known font format are skipped.
    pub fn build_registry(&self, base_dir: impl Into<PathBuf>) -> Registry {
        let mut registry = Registry::new(base_dir);

        for entry in &self.fonts {
            let mut font = Font::new(entry.name.clone());
            for (tag, path) in &entry.variants {
                match FontFormat::from_extension(tag) {
                    Some(format) => {
                        font.variants.insert(format, PathBuf::from(path));
                    }
                    None => warn!(family = %entry.family, tag = %tag, "ignoring unknown font variant"),
                }
            }
            registry.register_font(entry.family.clone(), font);

            for alias in &entry.aliases {
                registry.register_alias(alias.clone(), entry.family.clone());
            }
        }

        registry
    }
}

impl Registry {
    /// Load a registry from a TOML file, resolving font paths against `base_dir`.
    pub fn load_toml(config_path: &Path, base_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(FontsFile::load(config_path)?.build_registry(base_dir))
    }

    /// Registry from `<base_dir>/fonts.toml`, or the built-in default.
    pub fn with_config_or_default(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let config_path = base_dir.join(FONTS_TOML);

        match Self::load_toml(&config_path, base_dir.clone()) {
            Ok(registry) => {
                debug!(path = %config_path.display(), families = registry.len(), "loaded font config");
                registry
            }
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "using default font registry");
                Self::default_fonts(base_dir)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[[fonts]]
family = "inter"
name = "Inter Regular"
aliases = ["Inter", "inter sans"]

[fonts.variants]
ttf = "inter.ttf"
woff2 = "web/inter.woff2"
pfb = "legacy.pfb"

[[fonts]]
family = "mono"
"#;

    #[test]
    fn test_parse_and_build() {
        let file = FontsFile::parse(SAMPLE).unwrap();
        assert_eq!(file.fonts.len(), 2);

        let registry = file.build_registry("/fonts");
        let inter = registry.font("inter sans").unwrap();
        assert_eq!(inter.family, "inter");
        assert_eq!(inter.name, "Inter Regular");
        assert_eq!(inter.variants.len(), 2);
        assert!(registry.font("mono").unwrap().variants.is_empty());
    }

    #[test]
    fn test_parse_error_is_config_error() {
        assert!(matches!(FontsFile::parse("[[fonts]"), Err(Error::Config(_))));
    }

    #[test]
    fn test_with_config_or_default_reads_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(FONTS_TOML), SAMPLE).unwrap();

        let registry = Registry::with_config_or_default(dir.path());
        assert!(registry.font("Inter").is_some());
        assert!(registry.font("GT Pressura").is_none());
        assert_eq!(
            registry.font_path("inter", FontFormat::Ttf).unwrap(),
            dir.path().join("inter.ttf")
        );
    }

    #[test]
    fn test_with_config_or_default_falls_back() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::with_config_or_default(dir.path());
        assert!(registry.font("GT Pressura").is_some());

        std::fs::write(dir.path().join(FONTS_TOML), "not = [valid").unwrap();
        let registry = Registry::with_config_or_default(dir.path());
        assert!(registry.font("gt-pressura").is_some());
    }
}
