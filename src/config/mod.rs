//! Application configuration.
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! file (or no file at all) yields a working setup:
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [fonts]
//! fonts_dir = "fonts"
//! enable_web_fonts = true
//!
//! [banner]
//! builder = "direct"
//! ```
//!
//! After parsing, `PORT`, `GITHUB_TOKEN` and `ACCESS_CONTROL_ENABLED=true`
//! override the file, and relative directories are resolved against the
//! directory holding the config file.

mod access;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use access::AccessList;

use crate::banner::{BuilderKind, ResourceLocator};
use crate::error::{Error, Result};
use crate::github::GithubClient;

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub fonts: FontsConfig,
    pub templates: TemplatesConfig,
    pub github: GithubConfig,
    pub access_control: AccessControlConfig,
    pub banner: BannerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request worker threads.
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    /// Directory holding `fonts.toml` and the font files it names.
    pub fonts_dir: PathBuf,
    /// Link fonts from the font endpoint instead of embedding them.
    pub enable_web_fonts: bool,
    /// Base URL of the font endpoint. Empty means the server's own address.
    pub web_fonts_base_url: String,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            fonts_dir: PathBuf::from("deploy/fonts"),
            enable_web_fonts: false,
            web_fonts_base_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub templates_dir: PathBuf,
    /// Template used by the two-pass builder.
    pub default_template: String,
    pub templates: BTreeMap<String, TemplateEntry>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        let templates = [
            ("banner", "banner.svg.mustache", "Default banner template"),
            (
                "banner-stats",
                "banner-stats.svg.mustache",
                "Banner with repository statistics",
            ),
            ("banner-direct", "banner.svg", "Fixed-id template for the direct builder"),
        ]
        .into_iter()
        .map(|(name, path, description)| {
            (
                name.to_string(),
                TemplateEntry {
                    path: path.to_string(),
                    description: description.to_string(),
                },
            )
        })
        .collect();

        Self {
            templates_dir: PathBuf::from("deploy/templates"),
            default_template: "banner".to_string(),
            templates,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateEntry {
    pub path: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    pub api_url: String,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: crate::github::DEFAULT_API_URL.to_string(),
            cache_ttl_secs: 300,
            request_timeout_secs: 10,
        }
    }
}

impl GithubConfig {
    /// Upper bound for one API request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Client for the configured API, caching responses for `cache_ttl_secs`.
    pub fn client(&self) -> GithubClient {
        GithubClient::with_api_url(&self.api_url, &self.token)
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_secs))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessControlConfig {
    pub enabled: bool,
    pub allowed_orgs: Vec<String>,
    pub allowed_users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    pub builder: BuilderKind,
    /// Template used by the direct builder.
    pub direct_template: String,
    /// `Cache-Control` max-age for banner responses.
    pub http_cache_secs: u64,
    /// Upper bound for one rasterizer run.
    pub render_timeout_secs: u64,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            builder: BuilderKind::Template,
            direct_template: "banner-direct".to_string(),
            http_cache_secs: 3600,
            render_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Parse TOML text. Environment overrides are not applied.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
    }

    /// Load a config file.
    ///
    /// A file that does not exist yields the defaults. Environment
    /// overrides are applied either way; relative directories are resolved
    /// against the file's directory when the file was read.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            return Ok(config);
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml(&text)?;
        config.apply_env_overrides();
        config.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(config)
    }

    /// Apply `PORT`, `GITHUB_TOKEN` and `ACCESS_CONTROL_ENABLED` from the
    /// process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!(value = %port, error = %e, "invalid PORT, keeping {}", self.server.port),
            }
        }

        if let Some(token) = lookup("GITHUB_TOKEN").filter(|v| !v.is_empty()) {
            self.github.token = token;
        }

        if lookup("ACCESS_CONTROL_ENABLED").as_deref() == Some("true") {
            self.access_control.enabled = true;
        }
    }

    /// Resolve relative font and template directories against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for dir in [&mut self.fonts.fonts_dir, &mut self.templates.templates_dir] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(format!("failed to encode config: {e}")))
    }

    /// Write this configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Name of the template the given builder uses.
    pub fn template_name(&self, kind: BuilderKind) -> &str {
        match kind {
            BuilderKind::Template => &self.templates.default_template,
            BuilderKind::Direct => &self.banner.direct_template,
        }
    }

    /// Configured location of a named template.
    ///
    /// Names missing from the `templates` table are taken as file names.
    pub fn template_path(&self, name: &str) -> PathBuf {
        let file = self
            .templates
            .templates
            .get(name)
            .map_or(name, |entry| entry.path.as_str());
        self.templates.templates_dir.join(file)
    }

    /// Find the template file for a builder.
    ///
    /// The configured path wins; otherwise the name is searched in the
    /// templates directory and the default resource locations.
    pub fn locate_template(&self, kind: BuilderKind) -> Result<PathBuf> {
        let name = self.template_name(kind);
        let configured = self.template_path(name);
        if configured.exists() {
            return Ok(configured);
        }

        let mut locator = ResourceLocator::new();
        locator.prepend(&self.templates.templates_dir);
        let file = self
            .templates
            .templates
            .get(name)
            .map_or(name, |entry| entry.path.as_str());

        locator
            .find_template(file)
            .or_else(|| locator.find_template(name))
            .ok_or(Error::TemplateNotFound(configured))
    }

    /// Base URL for web fonts, or `None` when fonts are embedded.
    ///
    /// Without an explicit URL the server's own address is used.
    pub fn web_fonts_base_url(&self) -> Option<String> {
        if !self.fonts.enable_web_fonts {
            return None;
        }
        if !self.fonts.web_fonts_base_url.is_empty() {
            return Some(self.fonts.web_fonts_base_url.clone());
        }
        Some(format!("http://{}:{}", self.server.host, self.server.port))
    }

    pub fn access_list(&self) -> AccessList {
        AccessList::from_config(&self.access_control)
    }
}

/// Searches well-known locations for a config file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader over the default search list:
    ///
    /// 1. `deploy/banner-generator.toml`
    /// 2. `banner-generator.toml`
    /// 3. `config.toml`
    /// 4. `.banner-generator.toml`
    /// 5. `<user config dir>/banner-generator/config.toml`
    /// 6. `/etc/banner-generator/config.toml`
    pub fn new() -> Self {
        let mut config_paths: Vec<PathBuf> = [
            "deploy/banner-generator.toml",
            "banner-generator.toml",
            "config.toml",
            ".banner-generator.toml",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect();

        if let Some(dir) = user_config_dir() {
            config_paths.push(dir.join("banner-generator").join("config.toml"));
        }
        config_paths.push(PathBuf::from("/etc/banner-generator/config.toml"));

        Self { config_paths }
    }

    pub fn with_paths(config_paths: Vec<PathBuf>) -> Self {
        Self { config_paths }
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load `explicit` if given, else the first existing search path, else
    /// the defaults.
    pub fn load(&self, explicit: Option<&Path>) -> Result<AppConfig> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return AppConfig::load(path);
        }

        match self.config_paths.iter().find(|path| path.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                AppConfig::load(path)
            }
            None => {
                debug!("no config file found, using defaults");
                let mut config = AppConfig::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }
}

fn user_config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(|home| PathBuf::from(home).join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.templates.default_template, "banner");
        assert_eq!(config.github.cache_ttl_secs, 300);
        assert_eq!(config.banner.builder, BuilderKind::Template);
        assert_eq!(
            config.template_path("banner"),
            PathBuf::from("deploy/templates/banner.svg.mustache")
        );
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
[server]
port = 9000

[banner]
builder = "direct"
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.banner.builder, BuilderKind::Direct);
        assert_eq!(config.banner.http_cache_secs, 3600);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            AppConfig::from_toml("[server\nport = 1"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[server]\nport = \"eighty\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(env(&[
            ("PORT", "3000"),
            ("GITHUB_TOKEN", "ghp_x"),
            ("ACCESS_CONTROL_ENABLED", "true"),
        ]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.github.token, "ghp_x");
        assert!(config.access_control.enabled);
    }

    #[test]
    fn test_invalid_env_overrides_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(env(&[("PORT", "http"), ("ACCESS_CONTROL_ENABLED", "1")]));
        assert_eq!(config.server.port, 8080);
        assert!(!config.access_control.enabled);
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = AppConfig::default();
        config.templates.templates_dir = PathBuf::from("/abs/templates");
        config.resolve_paths(Path::new("/etc/banner"));
        assert_eq!(config.fonts.fonts_dir, PathBuf::from("/etc/banner/deploy/fonts"));
        assert_eq!(config.templates.templates_dir, PathBuf::from("/abs/templates"));
    }

    #[test]
    fn test_web_fonts_base_url() {
        let mut config = AppConfig::default();
        assert_eq!(config.web_fonts_base_url(), None);

        config.fonts.enable_web_fonts = true;
        config.server.host = "localhost".into();
        assert_eq!(config.web_fonts_base_url().as_deref(), Some("http://localhost:8080"));

        config.fonts.web_fonts_base_url = "https://cdn.example".into();
        assert_eq!(config.web_fonts_base_url().as_deref(), Some("https://cdn.example"));
    }

    #[test]
    fn test_template_names() {
        let config = AppConfig::default();
        assert_eq!(config.template_name(BuilderKind::Template), "banner");
        assert_eq!(config.template_name(BuilderKind::Direct), "banner-direct");
        assert_eq!(
            config.template_path("banner-direct"),
            PathBuf::from("deploy/templates/banner.svg")
        );
        assert_eq!(
            config.template_path("custom.svg"),
            PathBuf::from("deploy/templates/custom.svg")
        );
    }

    #[test]
    fn test_github_client_settings() {
        let config = AppConfig::from_toml(
            "[github]\napi_url = \"http://127.0.0.1:9\"\ncache_ttl_secs = 42\nrequest_timeout_secs = 3\n",
        )
        .unwrap();
        assert_eq!(config.github.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.github.client().cache().ttl(), Duration::from_secs(42));
    }

    #[test]
    fn test_retired_keys_are_ignored() {
        let text = "[server]\nread_timeout_secs = 5\nport = 9000\n\n[fonts]\ndefault_family = \"Inter\"\n";
        let config = AppConfig::from_toml(text).unwrap();
        assert_eq!(config.server.port, 9000);

        let saved = config.to_toml().unwrap();
        for key in ["read_timeout_secs", "write_timeout_secs", "web_fonts_dir", "default_family"] {
            assert!(!saved.contains(key), "{key}");
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.access_control.allowed_orgs = vec!["numtide".into()];
        let text = config.to_toml().unwrap();
        assert!(!text.contains("token"));
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }
}
