//! Banner builders.
//!
//! Two strategies turn a [`BannerData`] record into final SVG text:
//!
//! - [`TemplateBuilder`] renders a mustache template twice, the second time
//!   with the font CSS derived from the first render.
//! - [`DirectBuilder`] mutates a fixed-id SVG template through
//!   [`Document`](crate::svg::Document).
//!
//! [`BannerBuilder`] selects one of them from configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use repo_banner::banner::{BannerData, BuildOptions, Builder, TemplateBuilder};
//! use repo_banner::fonts::Registry;
//!
//! let registry = Arc::new(Registry::with_config_or_default("deploy/fonts"));
//! let builder = TemplateBuilder::from_file(registry, "deploy/templates/banner.svg.mustache", "")?;
//!
//! let data = BannerData::new("owner", "project").with_description("A tool");
//! let svg = builder.build(&data, &BuildOptions::default())?;
//! # Ok::<(), repo_banner::Error>(())
//! ```

mod direct;
mod locator;
mod template;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use direct::DirectBuilder;
pub use locator::ResourceLocator;
pub use template::{DescriptionLine, TemplateBuilder, TemplateData};

use crate::error::Result;
use crate::fonts::Registry;

/// Banner width in pixels.
pub const WIDTH: u32 = 1280;
/// Banner height in pixels.
pub const HEIGHT: u32 = 640;

/// Repository data shown on a banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerData {
    pub repo_name: String,
    pub description: String,
    pub owner: String,
    pub language: String,
    pub stars: u64,
    pub forks: u64,
}

impl BannerData {
    pub fn new(owner: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_stats(mut self, stars: u64, forks: u64) -> Self {
        self.stars = stars;
        self.forks = forks;
        self
    }

    /// True when there is a non-zero star or fork count to show.
    pub fn has_stats(&self) -> bool {
        self.stars > 0 || self.forks > 0
    }
}

/// Per-build switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Leave out stars, forks and language.
    pub no_stats: bool,
    /// Ask the template for its dark color scheme.
    pub dark_mode: bool,
}

/// Turns banner data into SVG text.
pub trait Builder: Send + Sync {
    fn build(&self, data: &BannerData, options: &BuildOptions) -> Result<String>;
}

/// Which builder strategy to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderKind {
    /// Two-pass mustache rendering.
    #[default]
    Template,
    /// Id-targeted mutation of a plain SVG.
    Direct,
}

impl std::fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuilderKind::Template => f.write_str("template"),
            BuilderKind::Direct => f.write_str("direct"),
        }
    }
}

/// A builder strategy chosen at configuration time.
#[derive(Debug, Clone)]
pub enum BannerBuilder {
    Template(TemplateBuilder),
    Direct(DirectBuilder),
}

impl BannerBuilder {
    /// Load the template at `template_path` for the given strategy.
    ///
    /// `web_fonts_base_url` switches both strategies from embedded font data
    /// to `@font-face` rules pointing at the font endpoint.
    pub fn open(
        kind: BuilderKind,
        registry: Arc<Registry>,
        template_path: impl AsRef<Path>,
        web_fonts_base_url: Option<&str>,
    ) -> Result<Self> {
        let base_url = web_fonts_base_url.unwrap_or_default();
        Ok(match kind {
            BuilderKind::Template => {
                BannerBuilder::Template(TemplateBuilder::from_file(registry, template_path, base_url)?)
            }
            BuilderKind::Direct => {
                BannerBuilder::Direct(DirectBuilder::from_file(registry, template_path, base_url)?)
            }
        })
    }

    pub fn kind(&self) -> BuilderKind {
        match self {
            BannerBuilder::Template(_) => BuilderKind::Template,
            BannerBuilder::Direct(_) => BuilderKind::Direct,
        }
    }
}

impl Builder for BannerBuilder {
    fn build(&self, data: &BannerData, options: &BuildOptions) -> Result<String> {
        match self {
            BannerBuilder::Template(builder) => builder.build(data, options),
            BannerBuilder::Direct(builder) => builder.build(data, options),
        }
    }
}

/// Read a template file, mapping a missing file to `TemplateNotFound`.
fn read_template(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(crate::Error::TemplateNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}
