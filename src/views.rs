//! Fixed catalog views and similar-item lookups.
//!
//! A view is a named, parameter-free listing such as "on sale" or "newest".
//! View caps default to the `[catalog]` config section and can be overridden
//! per call.

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

use catalog_core::{Catalog, Item};

use crate::config::CatalogConfig;
use crate::get::summary_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Explicitly ranked items, best position first.
    Ranked,
    /// Discounted items, in collection order.
    Sale,
    /// Items at or above the configured rating threshold.
    TopRated,
    /// Items at or below the configured price ceiling, cheapest first.
    Bargain,
    Newest,
    /// Ranked items first, then the rest by rating.
    Popular,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Ranked,
        View::Sale,
        View::TopRated,
        View::Bargain,
        View::Newest,
        View::Popular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Ranked => "ranked",
            View::Sale => "sale",
            View::TopRated => "top-rated",
            View::Bargain => "bargain",
            View::Newest => "newest",
            View::Popular => "popular",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ranked" | "ranking" => Ok(View::Ranked),
            "sale" | "on-sale" => Ok(View::Sale),
            "top-rated" | "rating" => Ok(View::TopRated),
            "bargain" => Ok(View::Bargain),
            "newest" | "new" => Ok(View::Newest),
            "popular" => Ok(View::Popular),
            other => bail!(
                "invalid view: '{}'. Use ranked, sale, top-rated, bargain, newest, or popular.",
                other
            ),
        }
    }
}

/// Items for `view`. `limit` overrides the configured cap; `ranked` and
/// `sale` are uncapped unless a limit is given.
pub fn select_view<'a>(
    catalog: &'a Catalog,
    view: View,
    settings: &CatalogConfig,
    limit: Option<usize>,
) -> Vec<&'a Item> {
    match view {
        View::Ranked => capped(catalog.ranked(), limit),
        View::Sale => capped(catalog.on_sale(), limit),
        View::TopRated => catalog.by_rating_threshold(
            settings.rating_threshold,
            limit.unwrap_or(settings.rating_limit),
        ),
        View::Bargain => catalog.by_price_ceiling(
            settings.bargain_max_price,
            limit.unwrap_or(settings.bargain_limit),
        ),
        View::Newest => catalog.newest(limit.unwrap_or(settings.newest_limit)),
        // No item has an empty id, so nothing is excluded.
        View::Popular => catalog.popular_fallback("", limit.unwrap_or(settings.popular_limit)),
    }
}

fn capped(mut items: Vec<&Item>, limit: Option<usize>) -> Vec<&Item> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

fn print_items(items: &[&Item]) {
    if items.is_empty() {
        println!("No results.");
        return;
    }
    for (i, item) in items.iter().enumerate() {
        println!("{}. {}", i + 1, summary_line(item));
    }
}

pub fn run_view(
    catalog: &Catalog,
    view: View,
    settings: &CatalogConfig,
    limit: Option<usize>,
) -> Result<()> {
    print_items(&select_view(catalog, view, settings, limit));
    Ok(())
}

/// `catalog similar <id>`: similar items with their shared-tag scores.
pub fn run_similar(catalog: &Catalog, id: &str, limit: usize) -> Result<()> {
    let Some(reference) = catalog.item_by_id(id) else {
        bail!("item not found: {}", id);
    };
    let scored = catalog.similar_scored(reference, limit);
    if scored.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, s) in scored.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, s.score, summary_line(s.item));
    }
    Ok(())
}
