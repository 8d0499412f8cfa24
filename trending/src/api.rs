use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error: {0}")]
    Message(&'static str),
    #[error("Repository not found: {0}")]
    NotFound(String),
    #[error("Invalid repository id '{0}', expected owner/name")]
    InvalidRepoId(String),
    #[error("No trending data for partition {0}")]
    NoData(String),
    // the only reason of `reqwest` dependency..
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Trending feed time slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, StrumDisplay, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

/// One candidate repository surfaced by the trending feed or the scraper.
///
/// `stars` keeps the feed's possibly comma-formatted string form; `stars_int`
/// is derived by the filter engine and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub stars: String,
    #[serde(default)]
    pub stars_today: Option<String>,
    pub url: String,
    #[serde(skip)]
    pub stars_int: u64,
}

/// Fetch result: entries plus the feed publication timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendingPage {
    pub items: Vec<TrendingEntry>,
    pub published_at: String,
}

/// What a single source yields. The fetcher synthesizes `published_at`
/// when the source does not carry one (the scraper never does).
#[derive(Clone, Debug, Default)]
pub struct SourcePage {
    pub items: Vec<TrendingEntry>,
    pub published_at: Option<String>,
}

/// A partition-addressable trending source, primary feed or scrape fallback.
///
/// An empty page is a valid answer at this layer; only the fetcher decides
/// that zero entries from every source is fatal.
#[async_trait]
pub trait TrendingSource: Send + Sync {
    async fn fetch_partition(&self, period: Period, language: &str) -> Result<SourcePage>;
}

/// `owner/name` repository identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(RepoId {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::InvalidRepoId(s.to_string())),
        }
    }
}

impl Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub spdx_id: Option<String>,
}

/// Repository metadata, the single round trip every health score requires.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Author date of the commit, RFC 3339, when the API provided one.
    pub date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueInfo {
    #[serde(default)]
    pub comments: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PullInfo {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub merged_at: Option<String>,
}

/// Remaining remote-call budget as reported by the metadata API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub remaining: u64,
    pub limit: u64,
}

/// Repository metadata API consumed by the health scorer and batch analyzer.
#[async_trait]
pub trait RepoApi: Send + Sync {
    async fn repo_info(&self, id: &RepoId) -> Result<RepoInfo>;

    async fn recent_commits(&self, id: &RepoId) -> Result<Vec<CommitInfo>>;

    async fn open_issues(&self, id: &RepoId) -> Result<Vec<IssueInfo>>;

    async fn pull_requests(&self, id: &RepoId) -> Result<Vec<PullInfo>>;

    async fn readme(&self, id: &RepoId) -> Result<Option<String>>;

    async fn quota(&self) -> Result<Quota>;

    /// Whether an elevated-quota credential is configured.
    fn authenticated(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_id_parse_test() {
        let id: RepoId = "rust-lang/rust".parse().unwrap();
        assert_eq!(id.owner, "rust-lang");
        assert_eq!(id.name, "rust");
        assert_eq!(id.full_name(), "rust-lang/rust");
    }

    #[test]
    fn repo_id_rejects_malformed_test() {
        for bad in ["rust", "a/b/c", "/rust", "rust/", "/"] {
            assert!(bad.parse::<RepoId>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn period_round_trip_test() {
        let period: Period = "weekly".parse().unwrap();
        assert_eq!(period, Period::Weekly);
        assert_eq!(period.to_string(), "weekly");
    }
}
