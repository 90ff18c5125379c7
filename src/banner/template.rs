//! Two-pass mustache builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{BannerData, BuildOptions, Builder, read_template};
use crate::error::{Error, Result};
use crate::fonts::{FontResolver, Registry};
use crate::svg::escape_xml;
use crate::util::{
    DESCRIPTION_MAX_LINES, DESCRIPTION_WIDTH, format_count, name_font_size, split_description,
};

/// Baseline of the first description line.
const DESCRIPTION_START_Y: f64 = 466.802;
/// Distance between description baselines.
const DESCRIPTION_LINE_HEIGHT: f64 = 63.0;

/// Values exposed to the banner template.
///
/// Strings coming from the repository are XML-escaped on construction, so
/// templates interpolate them raw (`{{{repoName}}}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
    pub repo_name: String,
    pub repo_name_font_size: u32,
    pub owner: String,
    pub has_description: bool,
    pub description: String,
    pub description_lines: Vec<DescriptionLine>,
    pub has_language: bool,
    pub language: String,
    pub stars: String,
    pub forks: String,
    pub has_stats: bool,
    pub dark_mode: bool,
    pub use_web_fonts: bool,
    pub use_embedded_font: bool,
    #[serde(rename = "fontCSS")]
    pub font_css: String,
    /// Base64 font payloads keyed `<family>FontData`.
    #[serde(flatten)]
    pub font_data: BTreeMap<String, String>,
}

/// One wrapped description line and its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionLine {
    pub text: String,
    pub y: String,
}

impl TemplateData {
    /// First-pass values: everything except fonts.
    pub fn new(data: &BannerData, options: &BuildOptions) -> Self {
        let description_lines = split_description(
            &data.description,
            DESCRIPTION_WIDTH,
            DESCRIPTION_MAX_LINES,
        )
        .into_iter()
        .enumerate()
        .map(|(i, line)| DescriptionLine {
            text: escape_xml(&line),
            y: format!(
                "{:.3}",
                DESCRIPTION_START_Y + i as f64 * DESCRIPTION_LINE_HEIGHT
            ),
        })
        .collect();

        Self {
            repo_name: escape_xml(&data.repo_name),
            repo_name_font_size: name_font_size(&data.repo_name),
            owner: escape_xml(&data.owner),
            has_description: !data.description.is_empty(),
            description: escape_xml(&data.description),
            description_lines,
            has_language: !options.no_stats && !data.language.is_empty(),
            language: escape_xml(&data.language),
            stars: format_count(data.stars),
            forks: format_count(data.forks),
            has_stats: !options.no_stats && data.has_stats(),
            dark_mode: options.dark_mode,
            ..Default::default()
        }
    }
}

/// Renders a mustache template, resolves the fonts it uses, then renders it
/// again with the font CSS filled in.
///
/// The template is compiled once, when the builder is created.
#[derive(Clone)]
pub struct TemplateBuilder {
    registry: Arc<Registry>,
    template_path: PathBuf,
    template: Arc<mustache::Template>,
    base_url: String,
}

impl fmt::Debug for TemplateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateBuilder")
            .field("template_path", &self.template_path)
            .field("base_url", &self.base_url)
            .field("families", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl TemplateBuilder {
    /// Builder over template text. An empty `base_url` embeds font data.
    ///
    /// Fails with [`Error::Template`] when the text is not a valid template.
    pub fn new(registry: Arc<Registry>, source: &str, base_url: &str) -> Result<Self> {
        let template = mustache::compile_str(source).map_err(|e| Error::Template(e.to_string()))?;
        Ok(Self {
            registry,
            template_path: PathBuf::new(),
            template: Arc::new(template),
            base_url: base_url.to_string(),
        })
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

        let mut builder = Self::new(registry, &source, base_url)?;
        builder.template_path = path.to_path_buf();
        Ok(builder)
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    fn render(&self, data: &TemplateData) -> Result<String> {
        self.template
            .render_to_string(data)
            .map_err(|e| Error::Template(e.to_string()))
    }
}

impl Builder for TemplateBuilder {
    fn build(&self, data: &BannerData, options: &BuildOptions) -> Result<String> {
        let mut template_data = TemplateData::new(data, options);
        let initial = self.render(&template_data)?;

        let resolver = FontResolver::new(&self.registry);
        let requirements = resolver.extract_fonts_from_svg(&initial)?;
        let resolved = resolver.resolve_fonts(&requirements, &self.base_url)?;
        debug!(
            repo = %data.repo_name,
            fonts = requirements.len(),
            web = !self.base_url.is_empty(),
            "resolved banner fonts"
        );

        if self.base_url.is_empty() {
            let payloads = resolved.encoded_data();
            template_data.use_embedded_font = true;
            template_data.font_css = resolved.embedded_css_with(&payloads);
            template_data.font_data = payloads.into_iter().collect();
        } else {
            template_data.use_web_fonts = true;
            template_data.font_css = resolved.web_css;
        }

        self.render(&template_data)
    }
}
