//! Best-effort scrape of the public trending listing page (fallback
//! source). Structural pattern matching over HTML fragments, not a DOM
//! parse: blocks that do not yield an `owner/name` path are skipped, and
//! an empty result is not an error at this layer.

use async_trait::async_trait;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, ClientBuilder};
use trending::api::{Period, Result, SourcePage, TrendingEntry, TrendingSource};

use crate::builder::REQUEST_TIMEOUT;

pub const DEFAULT_LISTING_URL: &str = "https://github.com/trending";

static BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<article class="Box-row".*?</article>"#).unwrap());
static PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="/([^/"]+/[^"]+)""#).unwrap());
static DESC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<p class="[^"]*col-9[^"]*"[^>]*>([^<]+)</p>"#).unwrap());
static STARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*stars").unwrap());
static STARS_ALT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)stargazers[^>]*>.*?(\d[\d,]*)").unwrap());
static LANG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"itemprop="programmingLanguage">([^<]+)<"#).unwrap());
static TODAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*stars?\s*today").unwrap());

pub struct ScrapeClient {
    client: Client,
    base_url: String,
}

impl ScrapeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // The listing page serves a bot-hostile variant to unknown agents.
        let client = ClientBuilder::default()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(ScrapeClient {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl TrendingSource for ScrapeClient {
    async fn fetch_partition(&self, period: Period, language: &str) -> Result<SourcePage> {
        let path = if language.eq_ignore_ascii_case("all") {
            String::new()
        } else {
            format!("/{}", language.to_lowercase())
        };
        let url = format!("{}{}?since={}", self.base_url, path, period);
        info!("Scraping trending listing: {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let html = response.text().await?;
        Ok(SourcePage {
            items: parse_listing(&html),
            published_at: None,
        })
    }
}

fn parse_listing(html: &str) -> Vec<TrendingEntry> {
    let mut entries = Vec::new();
    for block in BLOCK_RE.find_iter(html) {
        let block = block.as_str();
        let path = match PATH_RE.captures(block) {
            Some(captures) => captures[1].trim().to_string(),
            None => continue,
        };
        if !path.contains('/') {
            continue;
        }
        let description = DESC_RE
            .captures(block)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        let stars = STARS_RE
            .captures(block)
            .or_else(|| STARS_ALT_RE.captures(block))
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "0".to_string());
        let language = LANG_RE
            .captures(block)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        let stars_today = TODAY_RE.captures(block).map(|c| c[1].to_string());

        entries.push(TrendingEntry {
            url: format!("https://github.com/{}", path),
            full_name: path,
            description,
            language,
            stars,
            stars_today,
            stars_int: 0,
        });
    }
    entries
}
