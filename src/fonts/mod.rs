//! Font registry, resolution and serving.

mod config;
mod font;
mod registry;
mod resolver;
mod serve;

pub use config::{FONTS_TOML, FontEntry, FontsFile};
pub use font::{Font, FontFormat};
pub use registry::{DEFAULT_FAMILY, Registry, font_url};
pub(crate) use registry::web_font_face;
pub use resolver::{FontRequirement, FontResolver, ResolvedFonts, data_key, placeholder};
pub use serve::{FONT_CACHE_CONTROL, FONTS_PREFIX, FontResponse, serve_font};
