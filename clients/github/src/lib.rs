//! Reqwest-backed GitHub clients: the repository metadata API, the
//! structured trending feed and the HTML scrape fallback. Every remote
//! call goes cache-first, then through the shared rate limiter.

mod builder;
mod feed;
mod payload;
mod scrape;

pub use builder::{GithubClientBuilder, REQUEST_TIMEOUT};
pub use feed::{FeedClient, DEFAULT_FEED_URL};
pub use scrape::{ScrapeClient, DEFAULT_LISTING_URL};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use trending::api::{
    CommitInfo, Error, IssueInfo, PullInfo, Quota, RepoApi, RepoId, RepoInfo, Result,
};
use trending::cache::{CacheStore, Category};
use trending::limiter::RateLimiter;

const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// Manifest names probed by [`GithubClient::dependency_files`].
pub const DEPENDENCY_FILES: &[&str] = &[
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "Pipfile",
    "setup.cfg",
    "package.json",
    "Cargo.toml",
    "go.mod",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "composer.json",
    "Package.swift",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: String,
    pub size: Option<u64>,
}

pub struct GithubClient {
    pub(crate) client: Client,
    pub(crate) api_url: String,
    pub(crate) cache: Arc<CacheStore>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) authenticated: bool,
}

impl GithubClient {
    async fn get_json<T: DeserializeOwned>(&self, url: String, query: &[(&str, &str)]) -> Result<T> {
        self.limiter.throttle().await;
        debug!("GET {}", url);
        let response = self.client.get(&url).query(query).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url));
        }
        let response = response.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    fn cached<T: DeserializeOwned>(&self, category: Category, key: &str) -> Option<T> {
        self.cache
            .get(category, key)
            .and_then(|payload| serde_json::from_value(payload).ok())
    }

    fn store<T: Serialize>(&self, category: Category, key: &str, value: &T) {
        if let Ok(payload) = serde_json::to_value(value) {
            self.cache.put(category, key, &payload);
        }
    }

    /// Repository file listing via the git trees endpoint, recursively,
    /// retrying `master` when the default `main` guess is wrong.
    pub async fn file_tree(&self, id: &RepoId, branch: Option<&str>) -> Result<Vec<TreeEntry>> {
        let key = format!("{}@{}", id.full_name(), branch.unwrap_or("default"));
        if let Some(tree) = self.cached::<Vec<TreeEntry>>(Category::Tree, &key) {
            return Ok(tree);
        }

        let branch = match branch {
            Some(branch) => branch.to_string(),
            None => self.repo_info(id).await?.default_branch,
        };
        let tree_url = |branch: &str| {
            format!("{}/repos/{}/git/trees/{}", self.api_url, id.full_name(), branch)
        };
        let body: payload::TreeBody = match self.get_json(tree_url(&branch), &[("recursive", "1")]).await {
            Ok(body) => body,
            Err(Error::NotFound(_)) if branch == "main" => {
                self.get_json(tree_url("master"), &[("recursive", "1")]).await?
            }
            Err(err) => return Err(err),
        };

        let tree: Vec<TreeEntry> = body
            .tree
            .into_iter()
            .map(|entry| TreeEntry {
                path: entry.path,
                kind: entry.kind,
                size: entry.size,
            })
            .collect();
        self.store(Category::Tree, &key, &tree);
        Ok(tree)
    }

    /// Probes the repository for well-known dependency manifests and
    /// returns the raw content of every one found. Individual misses are
    /// expected and skipped.
    pub async fn dependency_files(&self, id: &RepoId) -> Result<BTreeMap<String, String>> {
        let key = id.full_name();
        if let Some(deps) = self.cached::<BTreeMap<String, String>>(Category::Deps, &key) {
            return Ok(deps);
        }

        let mut found = BTreeMap::new();
        for name in DEPENDENCY_FILES {
            let url = format!("{}/repos/{}/contents/{}", self.api_url, key, name);
            match self.get_raw(url).await {
                Ok(Some(content)) => {
                    found.insert(name.to_string(), content);
                }
                Ok(None) => {}
                Err(err) => debug!("Manifest probe {} failed for {}: {}", name, key, err),
            }
        }
        if !found.is_empty() {
            self.store(Category::Deps, &key, &found);
        }
        Ok(found)
    }

    async fn get_raw(&self, url: String) -> Result<Option<String>> {
        self.limiter.throttle().await;
        debug!("GET {} (raw)", url);
        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, RAW_MEDIA_TYPE)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.text().await?))
    }
}

#[async_trait]
impl RepoApi for GithubClient {
    async fn repo_info(&self, id: &RepoId) -> Result<RepoInfo> {
        let key = id.full_name();
        if let Some(info) = self.cached::<RepoInfo>(Category::RepoInfo, &key) {
            return Ok(info);
        }
        let url = format!("{}/repos/{}", self.api_url, key);
        let body: payload::RepoInfoBody = self.get_json(url, &[]).await?;
        let info = RepoInfo::from(body);
        self.store(Category::RepoInfo, &key, &info);
        Ok(info)
    }

    async fn recent_commits(&self, id: &RepoId) -> Result<Vec<CommitInfo>> {
        let key = id.full_name();
        if let Some(commits) = self.cached::<Vec<CommitInfo>>(Category::Commits, &key) {
            return Ok(commits);
        }
        let url = format!("{}/repos/{}/commits", self.api_url, key);
        let body: Vec<payload::CommitBody> = self.get_json(url, &[("per_page", "10")]).await?;
        let commits: Vec<CommitInfo> = body.into_iter().map(CommitInfo::from).collect();
        self.store(Category::Commits, &key, &commits);
        Ok(commits)
    }

    async fn open_issues(&self, id: &RepoId) -> Result<Vec<IssueInfo>> {
        let key = id.full_name();
        if let Some(issues) = self.cached::<Vec<IssueInfo>>(Category::Issues, &key) {
            return Ok(issues);
        }
        let url = format!("{}/repos/{}/issues", self.api_url, key);
        let body: Vec<payload::IssueBody> = self
            .get_json(url, &[("state", "open"), ("per_page", "10")])
            .await?;
        let issues: Vec<IssueInfo> = body.into_iter().map(IssueInfo::from).collect();
        self.store(Category::Issues, &key, &issues);
        Ok(issues)
    }

    async fn pull_requests(&self, id: &RepoId) -> Result<Vec<PullInfo>> {
        let key = id.full_name();
        if let Some(pulls) = self.cached::<Vec<PullInfo>>(Category::Pulls, &key) {
            return Ok(pulls);
        }
        let url = format!("{}/repos/{}/pulls", self.api_url, key);
        let body: Vec<payload::PullBody> = self
            .get_json(url, &[("state", "all"), ("per_page", "20")])
            .await?;
        let pulls: Vec<PullInfo> = body.into_iter().map(PullInfo::from).collect();
        self.store(Category::Pulls, &key, &pulls);
        Ok(pulls)
    }

    async fn readme(&self, id: &RepoId) -> Result<Option<String>> {
        let key = id.full_name();
        if let Some(readme) = self.cached::<Option<String>>(Category::Readme, &key) {
            return Ok(readme);
        }
        let url = format!("{}/repos/{}/readme", self.api_url, key);
        let readme = self.get_raw(url).await?;
        self.store(Category::Readme, &key, &readme);
        Ok(readme)
    }

    async fn quota(&self) -> Result<Quota> {
        let url = format!("{}/rate_limit", self.api_url);
        let body: payload::RateLimitBody = self.get_json(url, &[]).await?;
        Ok(Quota {
            remaining: body.resources.core.remaining,
            limit: body.resources.core.limit,
        })
    }

    fn authenticated(&self) -> bool {
        self.authenticated
    }
}
