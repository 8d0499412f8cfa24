//! Sequences health scoring across many repositories under a shared
//! remote-call budget.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::api::{Quota, RepoApi, RepoId, TrendingEntry};
use crate::score::{HealthScore, HealthScorer};

/// Approximate remote calls one scored repository costs.
pub const CALLS_PER_REPO: u64 = 5;

/// Courtesy delay between scored repositories, on top of the low-level
/// rate limiter.
pub const REPO_DELAY: Duration = Duration::from_millis(200);

#[derive(Clone, Debug)]
pub enum RepoAnalysis {
    Scored(HealthScore),
    Failed { repo: String, reason: String },
}

impl RepoAnalysis {
    pub fn repo(&self) -> &str {
        match self {
            RepoAnalysis::Scored(score) => &score.repo,
            RepoAnalysis::Failed { repo, .. } => repo,
        }
    }

    /// Failed analyses rank as zero, i.e. last.
    pub fn total(&self) -> u32 {
        match self {
            RepoAnalysis::Scored(score) => score.total,
            RepoAnalysis::Failed { .. } => 0,
        }
    }
}

/// Ranked batch outcome. `skipped` counts entries dropped by the quota
/// pre-check.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<RepoAnalysis>,
    pub skipped: usize,
}

pub struct BatchAnalyzer<C: RepoApi> {
    client: Arc<C>,
    scorer: HealthScorer<C>,
    delay: Duration,
}

impl<C: RepoApi> BatchAnalyzer<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::with_delay(client, REPO_DELAY)
    }

    pub fn with_delay(client: Arc<C>, delay: Duration) -> Self {
        let scorer = HealthScorer::new(client.clone());
        BatchAnalyzer { client, scorer, delay }
    }

    /// Scores every affordable entry sequentially and ranks the results
    /// by total descending. A malformed identifier or a failed metadata
    /// fetch yields a failed row without aborting the batch.
    pub async fn analyze_all(&self, entries: &[TrendingEntry]) -> BatchReport {
        let quota = self.client.quota().await.unwrap_or_else(|err| {
            warn!("Quota check failed: {}", err);
            Quota::default()
        });

        let mut budget = entries.len();
        let needed = entries.len() as u64 * CALLS_PER_REPO;
        if quota.remaining < needed && !self.client.authenticated() {
            budget = std::cmp::max(1, (quota.remaining / CALLS_PER_REPO) as usize);
            info!(
                "Rate limit: {} calls remaining, need ~{}; analyzing first {} repositories",
                quota.remaining, needed, budget
            );
        }
        let skipped = entries.len().saturating_sub(budget);

        let mut results = Vec::with_capacity(budget);
        for (index, entry) in entries.iter().take(budget).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.delay).await;
            }
            results.push(self.analyze_one(&entry.full_name).await);
        }
        results.sort_by(|a, b| b.total().cmp(&a.total()));

        BatchReport { results, skipped }
    }

    async fn analyze_one(&self, full_name: &str) -> RepoAnalysis {
        let id: RepoId = match full_name.parse() {
            Ok(id) => id,
            Err(err) => {
                return RepoAnalysis::Failed {
                    repo: full_name.to_string(),
                    reason: err.to_string(),
                }
            }
        };
        match self.scorer.score(&id).await {
            Ok(score) => RepoAnalysis::Scored(score),
            Err(err) => RepoAnalysis::Failed {
                repo: full_name.to_string(),
                reason: err.to_string(),
            },
        }
    }
}
