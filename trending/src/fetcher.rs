//! Primary-then-fallback trending acquisition with write-through caching.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};

use crate::api::{Error, Period, Result, SourcePage, TrendingPage, TrendingSource};
use crate::cache::{CacheStore, Category};

pub struct TrendingFetcher<P, F>
where
    P: TrendingSource,
    F: TrendingSource,
{
    primary: P,
    fallback: F,
    cache: Arc<CacheStore>,
}

impl<P, F> TrendingFetcher<P, F>
where
    P: TrendingSource,
    F: TrendingSource,
{
    pub fn new(primary: P, fallback: F, cache: Arc<CacheStore>) -> Self {
        TrendingFetcher { primary, fallback, cache }
    }

    /// Returns the entries for one `(period, language)` partition.
    ///
    /// Cache hits short-circuit everything. A primary failure of any kind
    /// (404 is expected for unsupported partitions) falls back to the
    /// scraper; an empty-but-successful primary response is accepted as
    /// genuinely quiet and does not. Zero entries from both sources is
    /// fatal for the invocation.
    pub async fn fetch(&self, period: Period, language: &str) -> Result<TrendingPage> {
        let key = cache_key(period, language);
        if let Some(payload) = self.cache.get(Category::Trending, &key) {
            if let Ok(page) = serde_json::from_value::<TrendingPage>(payload) {
                debug!("Trending cache hit for {}", key);
                return Ok(page);
            }
        }

        match self.primary.fetch_partition(period, language).await {
            Ok(page) => {
                let page = stamp(page);
                self.write_through(&key, &page);
                Ok(page)
            }
            Err(err) => {
                match status_of(&err) {
                    Some(404) => info!("Partition {} not in feed, trying scraper", key),
                    _ => warn!("Feed fetch failed ({}), falling back to scraper", err),
                }
                let fallback = self
                    .fallback
                    .fetch_partition(period, language)
                    .await
                    .unwrap_or_else(|err| {
                        warn!("Scrape fallback failed: {}", err);
                        SourcePage::default()
                    });
                if fallback.items.is_empty() {
                    return Err(Error::NoData(key));
                }
                let page = stamp(fallback);
                self.write_through(&key, &page);
                Ok(page)
            }
        }
    }

    fn write_through(&self, key: &str, page: &TrendingPage) {
        if let Ok(payload) = serde_json::to_value(page) {
            self.cache.put(Category::Trending, key, &payload);
        }
    }
}

fn cache_key(period: Period, language: &str) -> String {
    format!("{}_{}", period, language.to_lowercase())
}

fn status_of(err: &Error) -> Option<u16> {
    match err {
        Error::Request(err) => err.status().map(|status| status.as_u16()),
        _ => None,
    }
}

/// Synthesizes a publication timestamp (fetch time) when the source did
/// not carry one.
fn stamp(page: SourcePage) -> TrendingPage {
    let published_at = page
        .published_at
        .unwrap_or_else(|| Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string());
    TrendingPage { items: page.items, published_at }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TrendingEntry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entry(full_name: &str) -> TrendingEntry {
        TrendingEntry {
            full_name: full_name.to_string(),
            description: String::new(),
            language: String::new(),
            stars: "1".to_string(),
            stars_today: None,
            url: format!("https://github.com/{}", full_name),
            stars_int: 0,
        }
    }

    /// Scripted source counting how often it is consulted.
    struct FakeSource {
        response: std::result::Result<SourcePage, &'static str>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn ok(items: Vec<TrendingEntry>, published_at: Option<&str>) -> Self {
            FakeSource {
                response: Ok(SourcePage {
                    items,
                    published_at: published_at.map(str::to_string),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn err(message: &'static str) -> Self {
            FakeSource { response: Err(message), calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TrendingSource for &FakeSource {
        async fn fetch_partition(&self, _period: Period, _language: &str) -> Result<SourcePage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(page) => Ok(page.clone()),
                Err(message) => Err(Error::Message(message)),
            }
        }
    }

    fn cache() -> Arc<CacheStore> {
        let dir = tempfile::tempdir().unwrap();
        // Leak the tempdir handle so the files outlive the guard.
        Arc::new(CacheStore::new(dir.into_path()))
    }

    #[tokio::test]
    async fn primary_success_skips_fallback_test() {
        let primary = FakeSource::ok(vec![entry("a/b")], Some("Mon, 01 Jan 2026 00:00:00 GMT"));
        let fallback = FakeSource::err("should not be called");
        let fetcher = TrendingFetcher::new(&primary, &fallback, cache());

        let page = fetcher.fetch(Period::Daily, "rust").await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.published_at, "Mon, 01 Jan 2026 00:00:00 GMT");
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn primary_error_falls_back_test() {
        let primary = FakeSource::err("feed down");
        let fallback = FakeSource::ok(vec![entry("c/d"), entry("e/f")], None);
        let fetcher = TrendingFetcher::new(&primary, &fallback, cache());

        let page = fetcher.fetch(Period::Daily, "zig").await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(!page.published_at.is_empty(), "Published-at is synthesized");
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn empty_but_ok_primary_is_accepted_test() {
        let primary = FakeSource::ok(Vec::new(), Some("Mon, 01 Jan 2026 00:00:00 GMT"));
        let fallback = FakeSource::err("should not be called");
        let fetcher = TrendingFetcher::new(&primary, &fallback, cache());

        let page = fetcher.fetch(Period::Weekly, "fortran").await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(fallback.calls(), 0, "Fallback is reserved for transport/status errors");
    }

    #[tokio::test]
    async fn both_sources_empty_is_fatal_test() {
        let primary = FakeSource::err("feed down");
        let fallback = FakeSource::ok(Vec::new(), None);
        let fetcher = TrendingFetcher::new(&primary, &fallback, cache());

        let err = fetcher.fetch(Period::Daily, "zig").await.unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[tokio::test]
    async fn second_fetch_within_ttl_hits_cache_test() {
        let primary = FakeSource::err("feed down");
        let fallback = FakeSource::ok(vec![entry("c/d")], None);
        let fetcher = TrendingFetcher::new(&primary, &fallback, cache());

        let first = fetcher.fetch(Period::Daily, "zig").await.unwrap();
        let second = fetcher.fetch(Period::Daily, "zig").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(primary.calls(), 1, "Cache hit must skip the primary");
        assert_eq!(fallback.calls(), 1, "Cache hit must skip the fallback");
    }
}
