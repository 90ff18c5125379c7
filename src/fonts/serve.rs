//! Font file endpoint, independent of any HTTP server.

use percent_encoding::percent_decode_str;
use tracing::debug;

use super::font::FontFormat;
use super::registry::Registry;

/// Path prefix of the font endpoint.
pub const FONTS_PREFIX: &str = "/fonts/";

/// Cache lifetime for font files: one year.
pub const FONT_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Response produced for a font request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl FontResponse {
    fn not_found() -> Self {
        Self {
            status: 404,
            headers: vec![("Content-Type", "text/plain; charset=utf-8".to_string())],
            body: b"404 page not found\n".to_vec(),
        }
    }
}

/// Serve `/fonts/{family}/{filename}` from the registry.
///
/// The format comes from the filename's extension and the family segment
/// may be an alias or percent-encoded. Every failure, including an
/// unreadable file, is a 404.
pub fn serve_font(registry: &Registry, path: &str) -> FontResponse {
    let Some(rest) = path.strip_prefix(FONTS_PREFIX) else {
        return FontResponse::not_found();
    };

    let mut parts = rest.split('/');
    let (Some(family), Some(filename)) = (parts.next(), parts.next()) else {
        return FontResponse::not_found();
    };

    let Ok(family) = percent_decode_str(family).decode_utf8() else {
        return FontResponse::not_found();
    };
    let Some(format) = FontFormat::from_path(filename) else {
        return FontResponse::not_found();
    };

    let data = match registry
        .font_path(&family, format)
        .and_then(|path| Ok(std::fs::read(path)?))
    {
        Ok(data) => data,
        Err(e) => {
            debug!(family = %family, format = %format, error = %e, "font request missed");
            return FontResponse::not_found();
        }
    };

    FontResponse {
        status: 200,
        headers: vec![
            ("Content-Type", format.mime_type().to_string()),
            ("Cache-Control", FONT_CACHE_CONTROL.to_string()),
            ("Access-Control-Allow-Origin", "*".to_string()),
        ],
        body: data,
    }
}
