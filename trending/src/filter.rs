//! Pure, in-memory predicate filtering and comparator ordering over
//! fetched trending entries. No I/O, independent and composable with
//! sorting.

use strum_macros::{Display, EnumString};

use crate::api::TrendingEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortKey {
    Stars,
    Name,
}

#[derive(Clone, Debug, Default)]
pub struct Filter {
    pub min_stars: u64,
    pub max_stars: Option<u64>,
    pub search: Option<String>,
}

/// Parses a possibly comma-formatted star count. Malformed values parse
/// as 0 rather than raising.
pub fn parse_stars(raw: &str) -> u64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse().unwrap_or(0)
}

/// Keeps entries matching every predicate, preserving input order, and
/// attaches the parsed star count for later numeric sorting.
pub fn apply(entries: Vec<TrendingEntry>, filter: &Filter) -> Vec<TrendingEntry> {
    let search = filter.search.as_deref().map(str::to_lowercase);
    entries
        .into_iter()
        .filter_map(|mut entry| {
            let stars = parse_stars(&entry.stars);
            if stars < filter.min_stars {
                return None;
            }
            if let Some(max) = filter.max_stars {
                if stars > max {
                    return None;
                }
            }
            if let Some(term) = &search {
                let title = entry.full_name.to_lowercase();
                let description = entry.description.to_lowercase();
                if !title.contains(term.as_str()) && !description.contains(term.as_str()) {
                    return None;
                }
            }
            entry.stars_int = stars;
            Some(entry)
        })
        .collect()
}

/// Stable comparator sort. Stars order descending by default, name
/// ascending by default; `reverse` flips either.
pub fn sort_entries(entries: &mut [TrendingEntry], key: SortKey, reverse: bool) {
    match key {
        SortKey::Stars => entries.sort_by(|a, b| {
            let ord = b.stars_int.cmp(&a.stars_int);
            if reverse {
                ord.reverse()
            } else {
                ord
            }
        }),
        SortKey::Name => entries.sort_by(|a, b| {
            let ord = a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase());
            if reverse {
                ord.reverse()
            } else {
                ord
            }
        }),
    }
}
