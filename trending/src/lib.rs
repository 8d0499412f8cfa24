//! Trending repository digest pipeline
//!
//! # Overview
//!
//! Surfaces trending source repositories, enriches them with health signals
//! (activity, documentation, responsiveness, licensing) and ranks them.
//! The pipeline tolerates an unreliable, rate-limited upstream: a structured
//! trending feed is tried first, a best-effort scrape of the public listing
//! page covers feed outages and unsupported partitions, and every remote
//! payload is cached on disk with a per-category TTL.
//!
//! The crate is generic over the client seams ([`api::TrendingSource`],
//! [`api::RepoApi`]); the reqwest-backed GitHub implementations live in the
//! companion client crate. Remote calls are issued strictly sequentially,
//! one in flight at a time, paced by a shared [`limiter::RateLimiter`].

pub mod analyzer;
pub mod api;
pub mod cache;
pub mod fetcher;
pub mod filter;
pub mod limiter;
pub mod score;

pub use analyzer::{BatchAnalyzer, BatchReport, RepoAnalysis};
pub use fetcher::TrendingFetcher;
pub use score::{Grade, HealthScore, HealthScorer};
