//! GitHub repository metadata.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::debug;

use crate::banner::BannerData;
use crate::error::{Error, Result};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// How long fetched repository data stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

const USER_AGENT: &str = concat!("repo-banner/", env!("CARGO_PKG_VERSION"));

/// Repository metadata shown on a banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub language: String,
    pub stars: u64,
    pub forks: u64,
}

impl From<Repository> for BannerData {
    fn from(repo: Repository) -> Self {
        BannerData {
            repo_name: repo.name,
            description: repo.description,
            owner: repo.owner,
            language: repo.language,
            stars: repo.stars,
            forks: repo.forks,
        }
    }
}

/// Subset of the `GET /repos/{owner}/{repo}` response.
#[derive(Debug, Deserialize)]
struct ApiRepository {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
}

/// Split `owner/repo` into its two parts.
pub fn parse_repo_path(path: &str) -> Result<(&str, &str)> {
    match path.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(Error::Config(format!(
            "invalid repository '{path}', expected owner/repo"
        ))),
    }
}

/// Time-bounded cache of repository data, safe to share between threads.
#[derive(Debug)]
pub struct RepoCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, Repository)>>,
}

impl Default for RepoCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl RepoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Repository> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, repo)| repo.clone())
    }

    /// Store `repo` under `key`, dropping entries that have outlived the TTL.
    pub fn insert(&self, key: impl Into<String>, repo: Repository) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        entries.insert(key.into(), (Instant::now(), repo));
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Blocking GitHub API client with a response cache.
#[derive(Debug)]
pub struct GithubClient {
    agent: ureq::Agent,
    api_url: String,
    token: Option<String>,
    cache: RepoCache,
}

impl GithubClient {
    /// Client for the public API. An empty token means anonymous access.
    pub fn new(token: &str) -> Self {
        Self::with_api_url(DEFAULT_API_URL, token)
    }

    /// Client for another API endpoint (GitHub Enterprise, tests).
    pub fn with_api_url(api_url: &str, token: &str) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: (!token.is_empty()).then(|| token.to_string()),
            cache: RepoCache::default(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = RepoCache::new(ttl);
        self
    }

    pub fn cache(&self) -> &RepoCache {
        &self.cache
    }

    /// Repository data, served from cache while fresh.
    ///
    /// The returned name is `repo` as given, keeping the caller's
    /// capitalization.
    pub fn repository(&self, owner: &str, repo: &str, timeout: Duration) -> Result<Repository> {
        let key = format!("{owner}/{repo}");
        if let Some(cached) = self.cache.get(&key) {
            debug!(repo = %key, "repository cache hit");
            return Ok(cached);
        }

        let data = self.fetch_repository(owner, repo, timeout)?;
        self.cache.insert(key, data.clone());
        Ok(data)
    }

    /// Check that a repository exists and is readable, bypassing the cache.
    pub fn validate(&self, owner: &str, repo: &str, timeout: Duration) -> Result<()> {
        self.fetch_repository(owner, repo, timeout).map(|_| ())
    }

    fn fetch_repository(&self, owner: &str, repo: &str, timeout: Duration) -> Result<Repository> {
        let url = format!("{}/repos/{owner}/{repo}", self.api_url);
        debug!(url = %url, "fetching repository");

        let mut request = self
            .agent
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let mut response = request
            .config()
            .timeout_global(Some(timeout))
            .build()
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(404) => Error::RepositoryNotFound(format!("{owner}/{repo}")),
                other => Error::ExternalFetchFailed(other.to_string()),
            })?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::ExternalFetchFailed(e.to_string()))?;
        let api: ApiRepository = serde_json::from_str(&body)
            .map_err(|e| Error::ExternalFetchFailed(format!("invalid response: {e}")))?;

        Ok(Repository {
            name: repo.to_string(),
            description: api.description.unwrap_or_default(),
            owner: owner.to_string(),
            language: api.language.unwrap_or_default(),
            stars: api.stargazers_count,
            forks: api.forks_count,
        })
    }
}
