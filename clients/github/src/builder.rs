use std::sync::Arc;
use std::time::Duration;

use reqwest::header;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use trending::api::Result;
use trending::cache::CacheStore;
use trending::limiter::{RateLimiter, DEFAULT_DELAY};

use crate::GithubClient;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct GithubClientBuilder {
    client_builder: ClientBuilder,
    api_url: String,
    headers: HeaderMap,
    cache: Option<Arc<CacheStore>>,
    limiter: Option<Arc<RateLimiter>>,
    authenticated: bool,
}

impl Default for GithubClientBuilder {
    fn default() -> Self {
        let mut headers = HeaderMap::default();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("trending-digest"));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        Self {
            client_builder: ClientBuilder::default().timeout(REQUEST_TIMEOUT),
            api_url: "https://api.github.com".to_string(),
            headers,
            cache: None,
            limiter: None,
            authenticated: false,
        }
    }
}

impl GithubClientBuilder {
    pub fn try_with_token(mut self, token: secrecy::SecretString) -> Result<GithubClientBuilder> {
        let value = format!("token {}", token.expose_secret());
        self.authenticated = true;
        Ok(self.try_with_header(header::AUTHORIZATION, value)?)
    }

    pub fn try_with_user_agent<STR: AsRef<str>>(self, user_agent: STR) -> Result<GithubClientBuilder> {
        Ok(self.try_with_header(header::USER_AGENT, user_agent)?)
    }

    pub fn with_api_url<STR: AsRef<str>>(mut self, url: STR) -> GithubClientBuilder {
        self.api_url = url.as_ref().to_string();
        self
    }

    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> GithubClientBuilder {
        self.cache = Some(cache);
        self
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> GithubClientBuilder {
        self.limiter = Some(limiter);
        self
    }

    fn try_with_header(mut self, key: HeaderName, val: impl AsRef<str>) -> anyhow::Result<GithubClientBuilder> {
        let val = HeaderValue::from_str(val.as_ref())?;
        self.headers.insert(key, val);
        Ok(self)
    }

    pub fn build(self) -> Result<GithubClient> {
        let client = self.client_builder.default_headers(self.headers).build()?;
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(CacheStore::new(CacheStore::default_root())));
        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::new(DEFAULT_DELAY)));
        Ok(GithubClient {
            client,
            api_url: self.api_url,
            cache,
            limiter,
            authenticated: self.authenticated,
        })
    }
}
