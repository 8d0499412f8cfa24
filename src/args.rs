use clap::Parser;
use secrecy::SecretString;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use trending::api::Period;
use trending::filter::SortKey;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Trending period
    #[clap(short, long, env, default_value = "daily")]
    pub since: Period,

    /// Repositories language ("all" for every language)
    #[clap(short, long, env, default_value = "all")]
    pub language: String,

    /// Minimal star count
    #[clap(long, env, default_value_t = 0)]
    pub min_stars: u64,

    /// Maximal star count
    #[clap(long, env)]
    pub max_stars: Option<u64>,

    /// Substring searched in repository name or description
    #[clap(long, env)]
    pub search: Option<String>,

    /// Sort key (stars descending, name ascending)
    #[clap(long, env)]
    pub sort: Option<SortKey>,

    /// Reverse the sort direction
    #[clap(long, env)]
    pub reverse: bool,

    /// Number of repositories to display
    #[clap(short, long, env, default_value_t = 10, parse(try_from_str=top_in_range))]
    pub top: usize,

    /// Score repository health for the displayed repositories
    #[clap(short, long, env)]
    pub analyze: bool,

    /// Print the file tree of a single OWNER/REPO and exit
    #[clap(long, env, value_name = "OWNER/REPO")]
    pub tree: Option<String>,

    /// Print the dependency manifests of a single OWNER/REPO and exit
    #[clap(long, env, value_name = "OWNER/REPO")]
    pub deps: Option<String>,

    /// Delete cached responses and exit
    #[clap(long, env)]
    pub clear_cache: bool,

    /// API OAuth access token
    #[clap(long, env = "GITHUB_TOKEN")]
    pub api_token: Option<SecretString>,

    /// Repository API URL
    #[clap(long, env, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Trending feed URL override
    #[clap(long, env)]
    pub feed_url: Option<String>,

    /// Trending listing URL override (scrape fallback)
    #[clap(long, env)]
    pub scrape_url: Option<String>,

    /// Cache directory override
    #[clap(long, env)]
    pub cache_dir: Option<PathBuf>,
}

fn top_in_range(value: &str) -> clap::Result<usize, String> {
    number_in_range(value, 1, usize::MAX, "top".to_string())
}

fn number_in_range<T>(value: &str, min: T, max: T, name: String) -> clap::Result<T, String>
where
    T: FromStr + PartialOrd + Display,
    <T as FromStr>::Err: Display,
{
    value.parse::<T>().map_err(|err| format!("{}", err)).and_then(|value| {
        if value < min || value > max {
            return Err(format!("{} is not in range {} .. {}.", name, min, max));
        }
        Ok(value)
    })
}
