//! Wire-format bodies for the GitHub REST API, converted into the
//! pipeline's own types at the boundary.

use serde::Deserialize;
use trending::api::{CommitInfo, IssueInfo, License, PullInfo, RepoInfo};

#[derive(Deserialize, Debug)]
pub struct RepoInfoBody {
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub archived: bool,
    pub license: Option<LicenseBody>,
    #[serde(default = "main_branch")]
    pub default_branch: String,
}

fn main_branch() -> String {
    "main".to_string()
}

#[derive(Deserialize, Debug)]
pub struct LicenseBody {
    pub spdx_id: Option<String>,
}

impl From<RepoInfoBody> for RepoInfo {
    fn from(body: RepoInfoBody) -> Self {
        RepoInfo {
            description: body.description,
            language: body.language,
            html_url: body.html_url,
            stargazers_count: body.stargazers_count,
            open_issues_count: body.open_issues_count,
            archived: body.archived,
            license: body.license.map(|license| License { spdx_id: license.spdx_id }),
            default_branch: body.default_branch,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CommitBody {
    #[serde(default)]
    pub commit: CommitDetailBody,
}

#[derive(Deserialize, Debug, Default)]
pub struct CommitDetailBody {
    pub author: Option<CommitAuthorBody>,
}

#[derive(Deserialize, Debug)]
pub struct CommitAuthorBody {
    pub date: Option<String>,
}

impl From<CommitBody> for CommitInfo {
    fn from(body: CommitBody) -> Self {
        CommitInfo {
            date: body.commit.author.and_then(|author| author.date),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct IssueBody {
    #[serde(default)]
    pub comments: u64,
}

impl From<IssueBody> for IssueInfo {
    fn from(body: IssueBody) -> Self {
        IssueInfo { comments: body.comments }
    }
}

#[derive(Deserialize, Debug)]
pub struct PullBody {
    #[serde(default)]
    pub state: String,
    pub merged_at: Option<String>,
}

impl From<PullBody> for PullInfo {
    fn from(body: PullBody) -> Self {
        PullInfo {
            state: body.state,
            merged_at: body.merged_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct RateLimitBody {
    pub resources: RateLimitResources,
}

#[derive(Deserialize, Debug)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
}

#[derive(Deserialize, Debug)]
pub struct RateLimitResource {
    pub limit: u64,
    pub remaining: u64,
    #[serde(default)]
    pub reset: i64,
}

#[derive(Deserialize, Debug)]
pub struct TreeBody {
    #[serde(default)]
    pub tree: Vec<TreeEntryBody>,
}

#[derive(Deserialize, Debug)]
pub struct TreeEntryBody {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: Option<u64>,
}
