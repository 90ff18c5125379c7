//! # repo-banner
//!
//! Render social preview banners for GitHub repositories from SVG templates.
//!
//! ## Pipeline
//!
//! 1. Load a template (mustache or fixed-id SVG)
//! 2. Fill in the repository name, description and stats
//! 3. Find the font families the document uses and resolve them through a
//!    [`Registry`]
//! 4. Inject `@font-face` rules, either with embedded base64 data or linking
//!    to the font endpoint
//! 5. Optionally rasterize the SVG to PNG with an external tool
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use repo_banner::{BannerBuilder, BannerData, BuildOptions, Builder, BuilderKind, Registry};
//!
//! let registry = Arc::new(Registry::with_config_or_default("deploy/fonts"));
//! let builder = BannerBuilder::open(
//!     BuilderKind::Direct,
//!     registry,
//!     "deploy/templates/banner.svg",
//!     None,
//! )?;
//!
//! let data = BannerData::new("numtide", "treefmt")
//!     .with_description("one CLI to format your repo")
//!     .with_stats(1200, 80);
//! let svg = builder.build(&data, &BuildOptions::default())?;
//! # Ok::<(), repo_banner::Error>(())
//! ```

pub mod banner;
pub mod config;
pub mod error;
pub mod fonts;
pub mod github;
pub mod raster;
pub mod svg;
pub mod util;

#[cfg(any(feature = "cli", feature = "server"))]
pub mod logging;

#[cfg(feature = "server")]
pub mod server;

pub use banner::{BannerBuilder, BannerData, BuildOptions, Builder, BuilderKind};
pub use config::{AppConfig, ConfigLoader};
pub use error::{Error, Result};
pub use fonts::{FontResolver, Registry};
pub use github::GithubClient;
pub use raster::{ColorScheme, Rasterizer};
pub use svg::Document;
