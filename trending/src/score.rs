//! Multi-factor repository health scoring.
//!
//! Eight independent sub-metrics are computed from one metadata round trip
//! plus up to four more calls (commits, open issues, pull requests,
//! README). Points sum to a 0-100 total which maps onto a letter grade.
//! Only the metadata fetch is fatal; every other sample degrades to an
//! empty/absent value so a flaky upstream costs points, not the result.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use log::warn;
use strum_macros::Display;

use crate::api::{CommitInfo, IssueInfo, PullInfo, RepoApi, RepoId, RepoInfo, Result};

const INSTALL_KEYWORDS: [&str; 5] = ["install", "npm", "pip", "cargo", "setup"];
const USAGE_KEYWORDS: [&str; 4] = ["usage", "example", "getting started", "quick start"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    RecentCommits,
    ReadmeQuality,
    IssueResponse,
    PrMergeRate,
    HasLicense,
    NotArchived,
    LowOpenIssues,
    StarsVelocity,
}

impl Metric {
    pub fn max_points(self) -> u32 {
        match self {
            Metric::RecentCommits => 20,
            Metric::ReadmeQuality | Metric::IssueResponse | Metric::PrMergeRate => 15,
            Metric::NotArchived | Metric::LowOpenIssues | Metric::StarsVelocity => 10,
            Metric::HasLicense => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Pure step function of the total with boundaries at 40/55/70/85.
    pub fn from_total(total: u32) -> Grade {
        match total {
            85.. => Grade::A,
            70.. => Grade::B,
            55.. => Grade::C,
            40.. => Grade::D,
            _ => Grade::F,
        }
    }
}

/// Denormalized display fields carried alongside the scores.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreMeta {
    pub description: String,
    pub stars: u64,
    pub language: String,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct HealthScore {
    pub repo: String,
    pub scores: BTreeMap<Metric, u32>,
    pub details: BTreeMap<Metric, String>,
    pub total: u32,
    pub grade: Grade,
    pub meta: ScoreMeta,
}

#[derive(Constructor)]
pub struct HealthScorer<C: RepoApi> {
    client: Arc<C>,
}

impl<C: RepoApi> HealthScorer<C> {
    /// Scores one repository. The metadata fetch short-circuits on failure;
    /// the four sample fetches degrade to empty.
    pub async fn score(&self, id: &RepoId) -> Result<HealthScore> {
        let info = self.client.repo_info(id).await?;

        let commits = self.client.recent_commits(id).await.unwrap_or_else(|err| {
            warn!("Commit fetch failed for {}: {}", id, err);
            Vec::new()
        });
        let issues = self.client.open_issues(id).await.unwrap_or_else(|err| {
            warn!("Issue fetch failed for {}: {}", id, err);
            Vec::new()
        });
        let pulls = self.client.pull_requests(id).await.unwrap_or_else(|err| {
            warn!("Pull request fetch failed for {}: {}", id, err);
            Vec::new()
        });
        let readme = self.client.readme(id).await.unwrap_or_else(|err| {
            warn!("README fetch failed for {}: {}", id, err);
            None
        });

        let mut scores = BTreeMap::new();
        let mut details = BTreeMap::new();
        let mut put = |metric: Metric, (points, note): (u32, String)| {
            scores.insert(metric, points);
            details.insert(metric, note);
        };

        put(Metric::RecentCommits, score_recent_commits(&commits, Utc::now()));
        put(Metric::ReadmeQuality, score_readme(readme.as_deref()));
        put(Metric::IssueResponse, score_issue_response(&issues));
        put(Metric::PrMergeRate, score_pr_merge_rate(&pulls));
        put(Metric::HasLicense, score_license(&info));
        put(Metric::NotArchived, score_archived(&info));
        put(Metric::LowOpenIssues, score_open_issues(info.open_issues_count));
        put(Metric::StarsVelocity, score_stars(info.stargazers_count));

        let total = scores.values().sum();
        Ok(HealthScore {
            repo: id.full_name(),
            scores,
            details,
            total,
            grade: Grade::from_total(total),
            meta: ScoreMeta {
                description: info.description.unwrap_or_default(),
                stars: info.stargazers_count,
                language: info.language.unwrap_or_default(),
                url: info.html_url,
            },
        })
    }
}

/// 0-20 points from the age of the latest commit.
pub fn score_recent_commits(commits: &[CommitInfo], now: DateTime<Utc>) -> (u32, String) {
    let Some(latest) = commits.first() else {
        return (0, "No commits found".to_string());
    };
    let Some(date) = latest.date.as_deref() else {
        return (10, "Unknown activity".to_string());
    };
    let Ok(parsed) = DateTime::parse_from_rfc3339(date) else {
        return (10, "Unknown activity".to_string());
    };
    let days_ago = (now - parsed.with_timezone(&Utc)).num_days();
    match days_ago {
        d if d < 7 => (20, format!("Active ({}d ago)", d)),
        d if d < 30 => (15, format!("Recent ({}d ago)", d)),
        d if d < 90 => (10, format!("Moderate ({}d ago)", d)),
        d if d < 180 => (5, format!("Stale ({}d ago)", d)),
        d => (0, format!("Inactive ({}d ago)", d)),
    }
}

/// 0-15 points from README length, install/usage docs and badges.
pub fn score_readme(readme: Option<&str>) -> (u32, String) {
    let readme = match readme {
        Some(text) if !text.is_empty() => text,
        _ => return (0, "No README".to_string()),
    };
    let lower = readme.to_lowercase();
    let length = readme.chars().count();

    let mut score = 0;
    let mut notes = Vec::new();
    if length > 2000 {
        score += 5;
        notes.push("detailed");
    } else if length > 500 {
        score += 3;
        notes.push("basic");
    } else {
        notes.push("minimal");
    }
    if INSTALL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        score += 4;
        notes.push("install docs");
    }
    if USAGE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        score += 4;
        notes.push("usage docs");
    }
    if readme.contains("![") || readme.contains("[![") {
        score += 2;
    }
    (score.min(15), notes.join(", "))
}

/// 0-15 points from the share of sampled open issues with at least one
/// comment. Nothing sampled means nothing to be slow about: full points.
pub fn score_issue_response(issues: &[IssueInfo]) -> (u32, String) {
    if issues.is_empty() {
        return (15, "No open issues".to_string());
    }
    let responded = issues.iter().filter(|issue| issue.comments > 0).count();
    let rate = responded as f64 / issues.len() as f64;
    let percent = (rate * 100.0) as u32;
    if rate > 0.8 {
        (15, format!("{}% responded", percent))
    } else if rate > 0.5 {
        (10, format!("{}% responded", percent))
    } else if rate > 0.2 {
        (5, format!("{}% responded", percent))
    } else {
        (0, "Low response rate".to_string())
    }
}

/// 0-15 points from merged/closed among sampled pull requests. An
/// undefined ratio (nothing closed, or nothing sampled) scores 10.
pub fn score_pr_merge_rate(pulls: &[PullInfo]) -> (u32, String) {
    if pulls.is_empty() {
        return (10, "No PRs".to_string());
    }
    let merged = pulls.iter().filter(|pr| pr.merged_at.is_some()).count();
    let closed = pulls.iter().filter(|pr| pr.state == "closed").count();
    if closed == 0 {
        return (10, "All PRs open".to_string());
    }
    let rate = merged as f64 / closed as f64;
    let percent = (rate * 100.0) as u32;
    if rate > 0.7 {
        (15, format!("{}% merged", percent))
    } else if rate > 0.5 {
        (10, format!("{}% merged", percent))
    } else if rate > 0.3 {
        (5, format!("{}% merged", percent))
    } else {
        (0, "Low merge rate".to_string())
    }
}

pub fn score_license(info: &RepoInfo) -> (u32, String) {
    match &info.license {
        Some(license) => {
            let id = license.spdx_id.clone().unwrap_or_else(|| "Yes".to_string());
            (5, id)
        }
        None => (0, "None".to_string()),
    }
}

pub fn score_archived(info: &RepoInfo) -> (u32, String) {
    if info.archived {
        (0, "Archived!".to_string())
    } else {
        (10, "Active".to_string())
    }
}

pub fn score_open_issues(open_issues: u64) -> (u32, String) {
    match open_issues {
        n if n < 20 => (10, format!("{} open", n)),
        n if n < 100 => (7, format!("{} open", n)),
        n if n < 500 => (3, format!("{} open", n)),
        n => (0, format!("{} open (overloaded)", n)),
    }
}

pub fn score_stars(stars: u64) -> (u32, String) {
    match stars {
        n if n > 10000 => (10, format!("{} stars", n)),
        n if n > 1000 => (7, format!("{} stars", n)),
        n if n > 100 => (4, format!("{} stars", n)),
        n => (2, format!("{} stars", n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Error, IssueInfo, License, PullInfo, Quota};
    use async_trait::async_trait;
    use chrono::Duration;

    fn commit(date: Option<&str>) -> CommitInfo {
        CommitInfo { date: date.map(str::to_string) }
    }

    #[test]
    fn recent_commits_now_scores_full_test() {
        let now = Utc::now();
        let (points, _) = score_recent_commits(&[commit(Some(&now.to_rfc3339()))], now);
        assert_eq!(points, 20);
    }

    #[test]
    fn recent_commits_age_buckets_test() {
        let now = Utc::now();
        for (days, expected) in [(10, 15), (45, 10), (120, 5), (200, 0)] {
            let date = (now - Duration::days(days)).to_rfc3339();
            let (points, _) = score_recent_commits(&[commit(Some(&date))], now);
            assert_eq!(points, expected, "{} days ago", days);
        }
    }

    #[test]
    fn recent_commits_degenerate_cases_test() {
        let now = Utc::now();
        assert_eq!(score_recent_commits(&[], now).0, 0);
        assert_eq!(score_recent_commits(&[commit(None)], now).0, 10);
        assert_eq!(score_recent_commits(&[commit(Some("not a date"))], now).0, 10);
    }

    #[test]
    fn readme_scoring_test() {
        assert_eq!(score_readme(None).0, 0);
        assert_eq!(score_readme(Some("")).0, 0);

        // Minimal text, no keywords.
        assert_eq!(score_readme(Some("hello")).0, 0);

        // Long README with install, usage and badges caps at 15.
        let long = format!(
            "[![badge](x)] Install with cargo. Usage example below. {}",
            "x".repeat(2500)
        );
        assert_eq!(score_readme(Some(&long)).0, 15);

        // Basic length plus usage docs only.
        let basic = format!("Some usage example. {}", "y".repeat(600));
        assert_eq!(score_readme(Some(&basic)).0, 7);
    }

    #[test]
    fn issue_response_scoring_test() {
        assert_eq!(score_issue_response(&[]).0, 15);

        let responded = |n: u64| IssueInfo { comments: n };
        let issues: Vec<IssueInfo> = (0..10).map(|i| responded(u64::from(i > 0))).collect();
        // 9/10 responded
        assert_eq!(score_issue_response(&issues).0, 15);

        let issues: Vec<IssueInfo> = (0..10).map(|i| responded(u64::from(i < 6))).collect();
        assert_eq!(score_issue_response(&issues).0, 10);

        let issues: Vec<IssueInfo> = (0..10).map(|i| responded(u64::from(i < 3))).collect();
        assert_eq!(score_issue_response(&issues).0, 5);

        let issues: Vec<IssueInfo> = (0..10).map(|_| responded(0)).collect();
        assert_eq!(score_issue_response(&issues).0, 0);
    }

    #[test]
    fn pr_merge_rate_scoring_test() {
        assert_eq!(score_pr_merge_rate(&[]).0, 10);

        let open = PullInfo { state: "open".into(), merged_at: None };
        assert_eq!(score_pr_merge_rate(&[open.clone(), open.clone()]).0, 10);

        let merged = PullInfo { state: "closed".into(), merged_at: Some("2026-01-01T00:00:00Z".into()) };
        let closed = PullInfo { state: "closed".into(), merged_at: None };
        assert_eq!(score_pr_merge_rate(&[merged.clone(), merged.clone(), merged.clone(), closed.clone()]).0, 15);
        assert_eq!(score_pr_merge_rate(&[merged.clone(), merged.clone(), closed.clone()]).0, 10);
        assert_eq!(score_pr_merge_rate(&[merged.clone(), closed.clone(), closed.clone()]).0, 5);
        assert_eq!(score_pr_merge_rate(&[merged, closed.clone(), closed.clone(), closed.clone(), closed]).0, 0);
    }

    #[test]
    fn grade_boundaries_test() {
        assert_eq!(Grade::from_total(100), Grade::A);
        assert_eq!(Grade::from_total(85), Grade::A);
        assert_eq!(Grade::from_total(84), Grade::B);
        assert_eq!(Grade::from_total(70), Grade::B);
        assert_eq!(Grade::from_total(69), Grade::C);
        assert_eq!(Grade::from_total(55), Grade::C);
        assert_eq!(Grade::from_total(54), Grade::D);
        assert_eq!(Grade::from_total(40), Grade::D);
        assert_eq!(Grade::from_total(39), Grade::F);
        assert_eq!(Grade::from_total(0), Grade::F);
    }

    struct FakeApi {
        info: Option<RepoInfo>,
        commits_fail: bool,
    }

    #[async_trait]
    impl RepoApi for FakeApi {
        async fn repo_info(&self, id: &RepoId) -> Result<RepoInfo> {
            self.info
                .clone()
                .ok_or_else(|| Error::NotFound(id.full_name()))
        }

        async fn recent_commits(&self, _id: &RepoId) -> Result<Vec<CommitInfo>> {
            if self.commits_fail {
                return Err(Error::Message("boom"));
            }
            Ok(vec![commit(Some(&Utc::now().to_rfc3339()))])
        }

        async fn open_issues(&self, _id: &RepoId) -> Result<Vec<IssueInfo>> {
            Ok(Vec::new())
        }

        async fn pull_requests(&self, _id: &RepoId) -> Result<Vec<PullInfo>> {
            Ok(Vec::new())
        }

        async fn readme(&self, _id: &RepoId) -> Result<Option<String>> {
            let body = "Install via cargo. Usage example. ".repeat(100);
            Ok(Some(format!("[![ci](x)](y)\n{}", body)))
        }

        async fn quota(&self) -> Result<Quota> {
            Ok(Quota { remaining: 5000, limit: 5000 })
        }

        fn authenticated(&self) -> bool {
            true
        }
    }

    fn healthy_info() -> RepoInfo {
        RepoInfo {
            description: Some("desc".into()),
            language: Some("Rust".into()),
            html_url: "https://github.com/a/b".into(),
            stargazers_count: 20000,
            open_issues_count: 5,
            archived: false,
            license: Some(License { spdx_id: Some("MIT".into()) }),
            default_branch: "main".into(),
        }
    }

    #[tokio::test]
    async fn score_total_is_sum_of_parts_test() {
        let api = Arc::new(FakeApi { info: Some(healthy_info()), commits_fail: false });
        let scorer = HealthScorer::new(api);
        let score = scorer.score(&"a/b".parse().unwrap()).await.unwrap();

        assert_eq!(score.scores.len(), 8);
        assert_eq!(score.total, score.scores.values().sum::<u32>());
        assert!(score.total <= 100);
        // 20 + 15 + 15 + 10 + 5 + 10 + 10 + 10
        assert_eq!(score.total, 95);
        assert_eq!(score.grade, Grade::A);
        assert_eq!(score.meta.stars, 20000);
    }

    #[tokio::test]
    async fn metadata_failure_short_circuits_test() {
        let api = Arc::new(FakeApi { info: None, commits_fail: false });
        let scorer = HealthScorer::new(api);
        assert!(scorer.score(&"a/b".parse().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn sample_failure_degrades_not_fails_test() {
        let api = Arc::new(FakeApi { info: Some(healthy_info()), commits_fail: true });
        let scorer = HealthScorer::new(api);
        let score = scorer.score(&"a/b".parse().unwrap()).await.unwrap();
        assert_eq!(score.scores[&Metric::RecentCommits], 0);
        assert_eq!(score.total, score.scores.values().sum::<u32>());
    }
}
