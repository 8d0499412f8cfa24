//! Structured trending feed client (primary source).

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Deserializer};
use trending::api::{Period, Result, SourcePage, TrendingEntry, TrendingSource};
use trending::limiter::RateLimiter;

use crate::builder::REQUEST_TIMEOUT;

pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/isboyjc/github-trending-api/main/data";

pub struct FeedClient {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = ClientBuilder::default().timeout(REQUEST_TIMEOUT).build()?;
        Ok(FeedClient {
            client,
            base_url: base_url.into(),
            limiter,
        })
    }
}

#[async_trait]
impl TrendingSource for FeedClient {
    async fn fetch_partition(&self, period: Period, language: &str) -> Result<SourcePage> {
        self.limiter.throttle().await;
        let url = format!("{}/{}/{}.json", self.base_url, period, language.to_lowercase());
        debug!("Fetching trending feed: {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let document = response.json::<FeedDocument>().await?;
        Ok(SourcePage {
            items: document.items.into_iter().map(TrendingEntry::from).collect(),
            published_at: document.pub_date,
        })
    }
}

#[derive(Deserialize, Debug)]
struct FeedDocument {
    #[serde(default)]
    items: Vec<FeedItem>,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
}

/// One feed item. The upstream has shipped two field-name conventions
/// (`link`/`url`, `todayStars`/`addStars`); both map onto the internal
/// schema here.
#[derive(Deserialize, Debug)]
struct FeedItem {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    language: String,
    #[serde(default, deserialize_with = "count_field")]
    stars: String,
    #[serde(default, rename = "todayStars", alias = "addStars", deserialize_with = "optional_count_field")]
    today_stars: Option<String>,
    #[serde(default, rename = "link", alias = "url")]
    link: Option<String>,
}

/// Star counts arrive as either `"12,345"` or `12345`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CountValue {
    Text(String),
    Number(u64),
}

impl From<CountValue> for String {
    fn from(value: CountValue) -> Self {
        match value {
            CountValue::Text(text) => text,
            CountValue::Number(number) => number.to_string(),
        }
    }
}

fn count_field<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(CountValue::deserialize(deserializer)?.into())
}

fn optional_count_field<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<CountValue>::deserialize(deserializer)?.map(Into::into))
}

impl From<FeedItem> for TrendingEntry {
    fn from(item: FeedItem) -> Self {
        let url = item
            .link
            .unwrap_or_else(|| format!("https://github.com/{}", item.title));
        TrendingEntry {
            full_name: item.title,
            description: item.description,
            language: item.language,
            stars: item.stars,
            stars_today: item.today_stars,
            url,
            stars_int: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_item_old_convention_test() {
        let raw = r#"{
            "items": [{
                "title": "owner/repo",
                "description": "desc",
                "language": "Rust",
                "stars": "12,345",
                "todayStars": "200",
                "link": "https://github.com/owner/repo"
            }],
            "pubDate": "Mon, 01 Jan 2026 00:00:00 GMT"
        }"#;
        let document: FeedDocument = serde_json::from_str(raw).unwrap();
        let entry = TrendingEntry::from(document.items.into_iter().next().unwrap());
        assert_eq!(entry.full_name, "owner/repo");
        assert_eq!(entry.stars, "12,345");
        assert_eq!(entry.stars_today.as_deref(), Some("200"));
        assert_eq!(entry.url, "https://github.com/owner/repo");
        assert_eq!(document.pub_date.as_deref(), Some("Mon, 01 Jan 2026 00:00:00 GMT"));
    }

    #[test]
    fn feed_item_alternate_convention_test() {
        let raw = r#"{
            "items": [{
                "title": "owner/repo",
                "stars": 890,
                "addStars": 17,
                "url": "https://github.com/owner/repo"
            }]
        }"#;
        let document: FeedDocument = serde_json::from_str(raw).unwrap();
        let entry = TrendingEntry::from(document.items.into_iter().next().unwrap());
        assert_eq!(entry.stars, "890");
        assert_eq!(entry.stars_today.as_deref(), Some("17"));
        assert_eq!(entry.url, "https://github.com/owner/repo");
        assert!(entry.description.is_empty());
    }

    #[test]
    fn feed_item_without_link_synthesizes_url_test() {
        let raw = r#"{"items": [{"title": "a/b", "stars": "1"}]}"#;
        let document: FeedDocument = serde_json::from_str(raw).unwrap();
        let entry = TrendingEntry::from(document.items.into_iter().next().unwrap());
        assert_eq!(entry.url, "https://github.com/a/b");
    }
}
