use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// Cache category, each with its own staleness tolerance. A README barely
/// changes; open issues churn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Trending,
    RepoInfo,
    Readme,
    Tree,
    Deps,
    Issues,
    Commits,
    Pulls,
}

impl Category {
    /// Maximum record age in seconds before a read degrades to MISS.
    pub fn ttl(self) -> f64 {
        match self {
            Category::Trending => 3600.0,
            Category::RepoInfo | Category::Readme | Category::Tree | Category::Deps => 86400.0,
            Category::Issues | Category::Commits | Category::Pulls => 1800.0,
        }
    }

    fn dir_name(self) -> &'static str {
        self.into()
    }
}

/// Injectable time source so expiry tests do not sleep.
pub trait Clock: Send + Sync {
    fn now_epoch(&self) -> f64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0)
    }
}

#[derive(Serialize, Deserialize)]
struct CacheRecord {
    cached_at: f64,
    key: String,
    payload: Value,
}

/// Content-addressed, TTL-qualified key/value store on local disk.
///
/// Caching is an optimization, never a correctness requirement: every read
/// failure (absent, unreadable, malformed, expired) is a MISS and every
/// write failure is swallowed.
pub struct CacheStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(root: PathBuf) -> Self {
        Self::with_clock(root, Arc::new(SystemClock))
    }

    pub fn with_clock(root: PathBuf, clock: Arc<dyn Clock>) -> Self {
        CacheStore { root, clock }
    }

    /// Platform cache location, honoring the `XDG_CACHE_HOME` override.
    pub fn default_root() -> PathBuf {
        if let Some(dir) = std::env::var_os("XDG_CACHE_HOME") {
            return PathBuf::from(dir).join("trending-digest");
        }
        dirs::cache_dir()
            .map(|dir| dir.join("trending-digest"))
            .unwrap_or_else(|| PathBuf::from(".trending-digest-cache"))
    }

    pub fn get(&self, category: Category, key: &str) -> Option<Value> {
        let path = self.record_path(category, key);
        let raw = fs::read_to_string(path).ok()?;
        let record: CacheRecord = serde_json::from_str(&raw).ok()?;
        if self.clock.now_epoch() - record.cached_at > category.ttl() {
            debug!("Cache expired: {}/{}", category, key);
            return None;
        }
        Some(record.payload)
    }

    pub fn put(&self, category: Category, key: &str, payload: &Value) {
        let path = self.record_path(category, key);
        let record = CacheRecord {
            cached_at: self.clock.now_epoch(),
            key: key.to_string(),
            payload: payload.clone(),
        };
        if let Err(err) = write_record(&path, &record) {
            debug!("Cache write failed for {}/{}: {}", category, key, err);
        }
    }

    /// Deletes matching records, returns the count removed.
    pub fn clear(&self, category: Option<Category>) -> usize {
        match category {
            Some(category) => self.clear_dir(&self.root.join(category.dir_name())),
            None => Category::iter()
                .map(|category| self.clear_dir(&self.root.join(category.dir_name())))
                .sum(),
        }
    }

    fn clear_dir(&self, dir: &Path) -> usize {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };
        let mut count = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_record = path.extension().map_or(false, |ext| ext == "json");
            if is_record && fs::remove_file(&path).is_ok() {
                count += 1;
            }
        }
        count
    }

    fn record_path(&self, category: Category, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root
            .join(category.dir_name())
            .join(format!("{:x}.json", digest))
    }
}

fn write_record(path: &Path, record: &CacheRecord) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string(record)?;
    fs::write(path, body)
}
