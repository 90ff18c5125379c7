//! HTTP front end.
//!
//! [`BannerService::handle`] maps a method and URL to a response without
//! touching the network, and [`run`] puts it behind a `tiny_http` server
//! with a fixed pool of worker threads.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use percent_encoding::percent_decode_str;
use tracing::{error, info};

use crate::banner::{BannerBuilder, BannerData, BuildOptions, Builder};
use crate::config::{AccessList, AppConfig};
use crate::error::{Error, Result};
use crate::fonts::{FONTS_PREFIX, FontResponse, Registry, serve_font};
use crate::github::GithubClient;
use crate::raster::{ColorScheme, Rasterizer};

const INDEX_HTML: &str = include_str!("index.html");

/// A response ready to be written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", content_type.to_string())],
            body: body.into(),
        }
    }

    fn text(status: u16, message: impl Into<String>) -> Self {
        let mut body = message.into();
        body.push('\n');
        Self::new(status, "text/plain; charset=utf-8", body)
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl From<FontResponse> for HttpResponse {
    fn from(resp: FontResponse) -> Self {
        Self {
            status: resp.status,
            headers: resp.headers,
            body: resp.body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageFormat {
    Svg,
    Png,
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Index,
    Health,
    Font,
    Banner {
        owner: String,
        repo: String,
        format: ImageFormat,
    },
    InvalidBanner,
    NotFound,
}

fn route(path: &str) -> Route {
    match path {
        "/" => return Route::Index,
        "/health" => return Route::Health,
        _ => {}
    }
    if path.starts_with(FONTS_PREFIX) {
        return Route::Font;
    }

    let Some(rest) = path.strip_prefix("/banner/") else {
        return Route::NotFound;
    };
    let Some((owner, file)) = rest.split_once('/') else {
        return Route::NotFound;
    };
    if file.contains('/') {
        return Route::NotFound;
    }

    let (repo, format) = if let Some(repo) = file.strip_suffix(".svg") {
        (repo, ImageFormat::Svg)
    } else if let Some(repo) = file.strip_suffix(".png") {
        (repo, ImageFormat::Png)
    } else {
        return Route::NotFound;
    };

    let owner = percent_decode_str(owner).decode_utf8_lossy();
    let repo = percent_decode_str(repo).decode_utf8_lossy();
    if owner.is_empty() || repo.is_empty() {
        return Route::InvalidBanner;
    }

    Route::Banner {
        owner: owner.into_owned(),
        repo: repo.into_owned(),
        format,
    }
}

fn color_scheme(query: &str) -> ColorScheme {
    let dark = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key == "theme" && value.eq_ignore_ascii_case("dark"));
    if dark {
        ColorScheme::Dark
    } else {
        ColorScheme::Light
    }
}

/// Everything a request handler needs, shared by all workers.
#[derive(Debug)]
pub struct BannerService {
    registry: Arc<Registry>,
    builder: BannerBuilder,
    github: GithubClient,
    access: AccessList,
    rasterizer: Rasterizer,
    fetch_timeout: Duration,
    http_cache_secs: u64,
}

impl BannerService {
    pub fn new(
        registry: Arc<Registry>,
        builder: BannerBuilder,
        github: GithubClient,
        access: AccessList,
        rasterizer: Rasterizer,
    ) -> Self {
        Self {
            registry,
            builder,
            github,
            access,
            rasterizer,
            fetch_timeout: Duration::from_secs(10),
            http_cache_secs: 3600,
        }
    }

    /// Assemble the service described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = Arc::new(Registry::with_config_or_default(&config.fonts.fonts_dir));
        info!(fonts_dir = %config.fonts.fonts_dir.display(), families = registry.len(), "loaded fonts");

        let kind = config.banner.builder;
        let template = config.locate_template(kind)?;
        let base_url = config.web_fonts_base_url();
        if let Some(url) = &base_url {
            info!(base_url = %url, "web fonts enabled");
        }
        let builder = BannerBuilder::open(kind, registry.clone(), &template, base_url.as_deref())?;
        info!(builder = %kind, template = %template.display(), "using banner template");

        let github = config.github.client();

        let access = config.access_list();
        if !access.is_empty() {
            info!(allowed = ?access.entries(), "access control enabled");
        }

        let rasterizer = Rasterizer::new(Duration::from_secs(config.banner.render_timeout_secs));

        let mut service = Self::new(registry, builder, github, access, rasterizer);
        service.fetch_timeout = config.github.request_timeout();
        service.http_cache_secs = config.banner.http_cache_secs;
        Ok(service)
    }

    pub fn github(&self) -> &GithubClient {
        &self.github
    }

    /// Route one request.
    pub fn handle(&self, method: &str, url: &str) -> HttpResponse {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));

        if method != "GET" {
            return HttpResponse::text(405, "Method Not Allowed").with_header("Allow", "GET");
        }

        match route(path) {
            Route::Index => HttpResponse::new(200, "text/html; charset=utf-8", INDEX_HTML),
            Route::Health => self.health(),
            Route::Font => serve_font(&self.registry, path).into(),
            Route::Banner {
                owner,
                repo,
                format,
            } => self.banner(&owner, &repo, format, color_scheme(query)),
            Route::InvalidBanner => HttpResponse::text(400, "Invalid repository format"),
            Route::NotFound => HttpResponse::text(404, "404 page not found"),
        }
    }

    fn health(&self) -> HttpResponse {
        let body = serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "time": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        });
        HttpResponse::new(200, "application/json", body.to_string())
    }

    fn banner(
        &self,
        owner: &str,
        repo: &str,
        format: ImageFormat,
        scheme: ColorScheme,
    ) -> HttpResponse {
        if !self.access.is_allowed(owner, repo) {
            return HttpResponse::text(403, "Access denied: This repository is not allowed");
        }

        let data: BannerData = match self.github.repository(owner, repo, self.fetch_timeout) {
            Ok(repo) => repo.into(),
            Err(e) => return error_response("Failed to fetch repository data", &e),
        };

        let options = BuildOptions {
            no_stats: false,
            dark_mode: scheme == ColorScheme::Dark,
        };
        let svg = match self.builder.build(&data, &options) {
            Ok(svg) => svg,
            Err(e) => return error_response("Failed to generate banner", &e),
        };

        let (content_type, body) = match format {
            ImageFormat::Svg => ("image/svg+xml", svg.into_bytes()),
            ImageFormat::Png => match self.rasterizer.rasterize(svg.as_bytes(), scheme) {
                Ok(png) => ("image/png", png),
                Err(e) => return error_response("Failed to convert to PNG", &e),
            },
        };

        HttpResponse::new(200, content_type, body)
            .with_header("Cache-Control", format!("public, max-age={}", self.http_cache_secs))
            .with_header("Access-Control-Allow-Origin", "*")
    }
}

fn error_response(context: &str, err: &Error) -> HttpResponse {
    HttpResponse::text(err.status_code(), format!("{context}: {err}"))
}

/// Serve `service` on `addr` until the listener fails.
pub fn run(service: Arc<BannerService>, addr: &str, workers: usize) -> Result<()> {
    let server = tiny_http::Server::http(addr)
        .map_err(|e| Error::Io(std::io::Error::other(format!("failed to bind {addr}: {e}"))))?;
    let server = Arc::new(server);
    info!(addr = %addr, workers, "listening");

    let handles: Vec<_> = (0..workers.max(1))
        .map(|_| {
            let server = server.clone();
            let service = service.clone();
            thread::spawn(move || {
                while let Ok(request) = server.recv() {
                    respond(&service, request);
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }
    Ok(())
}

fn respond(service: &BannerService, request: tiny_http::Request) {
    let started = Instant::now();
    let method = request.method().to_string();
    let url = request.url().to_string();
    let remote = request
        .remote_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_default();

    let resp = service.handle(&method, &url);
    let status = resp.status;

    let mut response =
        tiny_http::Response::from_data(resp.body).with_status_code(tiny_http::StatusCode(status));
    for (name, value) in &resp.headers {
        if let Ok(header) = tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }

    if let Err(e) = request.respond(response) {
        error!(url = %url, error = %e, "failed to write response");
    }
    info!(
        method = %method,
        path = %url,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        remote = %remote,
        "request"
    );
}
