pub use args::Args;

mod args;

use std::sync::Arc;

use github_client::{FeedClient, GithubClient, GithubClientBuilder, ScrapeClient};
use github_client::{DEFAULT_FEED_URL, DEFAULT_LISTING_URL};
use log::debug;
use trending::api::{RepoId, Result, TrendingEntry};
use trending::cache::CacheStore;
use trending::filter::{self, Filter};
use trending::limiter::{RateLimiter, DEFAULT_DELAY};
use trending::{BatchAnalyzer, RepoAnalysis, TrendingFetcher};

pub async fn run(args: Args) -> Result<()> {
    let root = args.cache_dir.clone().unwrap_or_else(CacheStore::default_root);
    debug!("Cache root: {}", root.display());
    let cache = Arc::new(CacheStore::new(root));

    if args.clear_cache {
        let removed = cache.clear(None);
        println!("Removed {} cached responses.", removed);
        return Ok(());
    }

    let limiter = Arc::new(RateLimiter::new(DEFAULT_DELAY));

    let mut builder = GithubClientBuilder::default()
        .with_api_url(&args.api_url)
        .with_cache(cache.clone())
        .with_limiter(limiter.clone());
    if let Some(token) = args.api_token.clone() {
        builder = builder.try_with_token(token)?;
    }
    let client = Arc::new(builder.build()?);

    if let Some(spec) = &args.tree {
        return print_tree(&client, spec).await;
    }
    if let Some(spec) = &args.deps {
        return print_deps(&client, spec).await;
    }

    let feed_url = args.feed_url.as_deref().unwrap_or(DEFAULT_FEED_URL);
    let scrape_url = args.scrape_url.as_deref().unwrap_or(DEFAULT_LISTING_URL);
    let feed = FeedClient::new(feed_url, limiter.clone())?;
    let scrape = ScrapeClient::new(scrape_url)?;
    let fetcher = TrendingFetcher::new(feed, scrape, cache);

    let page = fetcher.fetch(args.since, &args.language).await?;
    let published_at = page.published_at;

    let filter = Filter {
        min_stars: args.min_stars,
        max_stars: args.max_stars,
        search: args.search.clone(),
    };
    let mut entries = filter::apply(page.items, &filter);
    if let Some(key) = args.sort {
        filter::sort_entries(&mut entries, key, args.reverse);
    }
    entries.truncate(args.top);

    if entries.is_empty() {
        println!("No repositories matched the given filters.");
        return Ok(());
    }

    if args.analyze {
        analyze(client, &entries).await;
    } else {
        list(&entries);
    }
    println!("Updated: {}", published_at);
    Ok(())
}

fn list(entries: &[TrendingEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        let today = entry
            .stars_today
            .as_deref()
            .map(|stars| format!(" (+{} today)", stars))
            .unwrap_or_default();
        println!(
            "{:>3}. {} [{}] {} stars{}",
            index + 1,
            entry.full_name,
            label(&entry.language),
            entry.stars,
            today
        );
        if !entry.description.is_empty() {
            println!("     {}", entry.description);
        }
    }
}

async fn analyze(client: Arc<GithubClient>, entries: &[TrendingEntry]) {
    let analyzer = BatchAnalyzer::new(client);
    let report = analyzer.analyze_all(entries).await;
    if report.skipped > 0 {
        println!(
            "Rate limit: skipping {} repositories (set GITHUB_TOKEN for a larger quota).",
            report.skipped
        );
    }
    for (index, analysis) in report.results.iter().enumerate() {
        match analysis {
            RepoAnalysis::Scored(score) => {
                println!(
                    "{:>3}. {} {:>3}/100 [{}] {} stars",
                    index + 1,
                    score.repo,
                    score.total,
                    score.grade,
                    score.meta.stars
                );
            }
            RepoAnalysis::Failed { repo, reason } => {
                println!("{:>3}. {}   0/100 [?] {}", index + 1, repo, reason);
            }
        }
    }
}

async fn print_tree(client: &GithubClient, spec: &str) -> Result<()> {
    let id: RepoId = spec.parse()?;
    let tree = client.file_tree(&id, None).await?;
    println!("{} ({} entries)", id, tree.len());
    for entry in tree {
        match entry.size {
            Some(size) => println!("{} {} ({} B)", marker(&entry.kind), entry.path, size),
            None => println!("{} {}", marker(&entry.kind), entry.path),
        }
    }
    Ok(())
}

async fn print_deps(client: &GithubClient, spec: &str) -> Result<()> {
    let id: RepoId = spec.parse()?;
    let manifests = client.dependency_files(&id).await?;
    if manifests.is_empty() {
        println!("No dependency manifests found in {}.", id);
        return Ok(());
    }
    for (name, content) in manifests {
        println!("==> {} <==", name);
        println!("{}", content.trim_end());
    }
    Ok(())
}

fn label(language: &str) -> &str {
    if language.is_empty() {
        "n/a"
    } else {
        language
    }
}

fn marker(kind: &str) -> &'static str {
    if kind == "tree" {
        "d"
    } else {
        "-"
    }
}
