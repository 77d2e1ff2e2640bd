//! Query engine over the compact search index.
//!
//! A query runs three stages, strictly in this order:
//!
//! 1. **Text search**: the query is split on whitespace into lowercase
//!    terms; an entry matches when every term is a substring of the lowercase
//!    haystack `title performers… categories… maker`. Blank queries skip
//!    this stage.
//! 2. **Filters**: on-sale only, performer-count bucket, price ceiling and
//!    required tags, all AND-combined. Each is independently optional.
//! 3. **Sort**: exactly one [`SortOrder`]. Sorting is stable, so entries that
//!    compare equal keep index order and identical inputs always produce
//!    identical output.
//!
//! The input index is never modified; results are fresh clones.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::model::{ParseParamError, SearchIndexEntry};

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Release date, most recent first.
    #[default]
    New,
    /// Ranking position ascending; unranked entries last.
    Rank,
    /// Rating descending; unrated entries count as 0.
    Rating,
    /// Discount descending; undiscounted entries count as 0.
    Discount,
    /// Price ascending.
    Price,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::New => "new",
            SortOrder::Rank => "rank",
            SortOrder::Rating => "rating",
            SortOrder::Discount => "discount",
            SortOrder::Price => "price",
        }
    }

    fn compare(&self, a: &SearchIndexEntry, b: &SearchIndexEntry) -> Ordering {
        match self {
            SortOrder::New => b.release_date.cmp(&a.release_date),
            SortOrder::Rank => rank_key(a).cmp(&rank_key(b)),
            SortOrder::Rating => b
                .rating
                .unwrap_or(0.0)
                .partial_cmp(&a.rating.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
            SortOrder::Discount => b
                .discount_percent
                .unwrap_or(0)
                .cmp(&a.discount_percent.unwrap_or(0)),
            SortOrder::Price => a.price.cmp(&b.price),
        }
    }
}

fn rank_key(entry: &SearchIndexEntry) -> u64 {
    entry.ranking_position.map_or(u64::MAX, u64::from)
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" | "newest" => Ok(SortOrder::New),
            "rank" | "ranking" => Ok(SortOrder::Rank),
            "rating" => Ok(SortOrder::Rating),
            "discount" => Ok(SortOrder::Discount),
            "price" => Ok(SortOrder::Price),
            other => Err(ParseParamError::new(
                "sort order",
                other,
                "new, rank, rating, discount, or price",
            )),
        }
    }
}

/// Performer-count bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformerCountFilter {
    #[default]
    All,
    /// Exactly one performer (uncredited works included).
    Solo,
    /// Two or more performers.
    Multi,
}

impl PerformerCountFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformerCountFilter::All => "all",
            PerformerCountFilter::Solo => "solo",
            PerformerCountFilter::Multi => "multi",
        }
    }

    fn accepts(&self, entry: &SearchIndexEntry) -> bool {
        match self {
            PerformerCountFilter::All => true,
            PerformerCountFilter::Solo => entry.performer_count() == 1,
            PerformerCountFilter::Multi => entry.performer_count() >= 2,
        }
    }
}

impl fmt::Display for PerformerCountFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformerCountFilter {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(PerformerCountFilter::All),
            "solo" => Ok(PerformerCountFilter::Solo),
            "multi" => Ok(PerformerCountFilter::Multi),
            other => Err(ParseParamError::new(
                "performer count filter",
                other,
                "all, solo, or multi",
            )),
        }
    }
}

/// All inputs for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    pub text: String,
    pub on_sale_only: bool,
    pub performer_count: PerformerCountFilter,
    /// Inclusive price ceiling.
    pub max_price: Option<u32>,
    /// Every tag must appear in an entry's categories.
    pub required_tags: Vec<String>,
    pub sort: SortOrder,
}

impl QueryParams {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Run a query against `index`.
pub fn query(index: &[SearchIndexEntry], params: &QueryParams) -> Vec<SearchIndexEntry> {
    let matched = search_text(index, &params.text);
    let mut filtered = apply_filters(matched, params);
    filtered.sort_by(|a, b| params.sort.compare(a, b));
    filtered.into_iter().cloned().collect()
}

/// Stage 1: AND-of-substrings text match. Blank text matches everything.
pub fn search_text<'a>(index: &'a [SearchIndexEntry], text: &str) -> Vec<&'a SearchIndexEntry> {
    let terms = split_terms(text);
    if terms.is_empty() {
        return index.iter().collect();
    }
    index
        .iter()
        .filter(|entry| {
            let haystack = haystack(entry);
            terms.iter().all(|term| haystack.contains(term.as_str()))
        })
        .collect()
}

/// Stage 2: AND-combined filters.
pub fn apply_filters<'a>(
    entries: Vec<&'a SearchIndexEntry>,
    params: &QueryParams,
) -> Vec<&'a SearchIndexEntry> {
    entries
        .into_iter()
        .filter(|e| !params.on_sale_only || e.is_on_sale())
        .filter(|e| params.performer_count.accepts(e))
        .filter(|e| params.max_price.map_or(true, |max| e.price <= max))
        .filter(|e| {
            params
                .required_tags
                .iter()
                .all(|tag| e.categories.iter().any(|c| c == tag))
        })
        .collect()
}

fn split_terms(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

fn haystack(entry: &SearchIndexEntry) -> String {
    std::iter::once(entry.title.as_str())
        .chain(entry.performers.iter().map(String::as_str))
        .chain(entry.categories.iter().map(String::as_str))
        .chain(std::iter::once(entry.maker.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Category frequency across `entries`, most frequent first, at most `limit`.
///
/// Each entry contributes a category once. Equal counts keep first-seen order.
pub fn tag_frequencies(entries: &[SearchIndexEntry], limit: usize) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        let mut in_entry: HashSet<&str> = HashSet::new();
        for tag in &entry.categories {
            if tag.is_empty() || !in_entry.insert(tag.as_str()) {
                continue;
            }
            let count = counts.entry(tag.as_str()).or_insert_with(|| {
                order.push(tag.as_str());
                0
            });
            *count += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|tag| (tag.to_string(), counts.get(tag).copied().unwrap_or(0)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

/// Top `limit` categories by frequency.
pub fn popular_tags(entries: &[SearchIndexEntry], limit: usize) -> Vec<String> {
    tag_frequencies(entries, limit)
        .into_iter()
        .map(|(tag, _)| tag)
        .collect()
}
