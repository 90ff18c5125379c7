//! Error types for banner generation.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while locating, building or rendering a banner.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("error parsing SVG: {0}")]
    SvgParse(String),

    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("font not found: {0}")]
    FontFamilyNotFound(String),

    #[error("format '{format}' not found for font '{family}'")]
    FontFormatNotFound { family: String, format: String },

    #[error("element with id '{0}' not found")]
    ElementNotFound(String),

    #[error("style element not found")]
    StyleBlockMissing,

    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("failed to fetch repository: {0}")]
    ExternalFetchFailed(String),

    #[error(
        "no SVG to PNG converter available. Please install rsvg-convert, ImageMagick, or Inkscape"
    )]
    RasterizerUnavailable,

    #[error("rasterizer timed out after {0:?}")]
    RasterizerTimeout(Duration),

    #[error("rasterizer failed: {0}")]
    RasterizerFailed(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for lookups that missed rather than failed.
    ///
    /// Document mutations report a missing target element this way, and
    /// callers that expect template variants without optional elements
    /// discard these errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ElementNotFound(_) | Error::StyleBlockMissing)
    }

    /// HTTP status code for this error at the server boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::RepositoryNotFound(_) | Error::ExternalFetchFailed(_) => 404,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
