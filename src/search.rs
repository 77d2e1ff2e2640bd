//! Faceted search over the compact index.
//!
//! The index comes either from the loaded catalog or from a previously
//! exported `search-index.json` (`catalog search --index <file>`), so the
//! query path can be exercised exactly as a client would run it.

use anyhow::Result;
use std::path::Path;

use catalog_core::query::tag_frequencies;
use catalog_core::{query, Catalog, QueryParams, SearchIndexEntry};

use crate::export::read_search_index;

/// Resolve the index to query: the exported file if given, else the catalog.
pub fn load_index(catalog: &Catalog, index_path: Option<&Path>) -> Result<Vec<SearchIndexEntry>> {
    match index_path {
        Some(path) => read_search_index(path),
        None => Ok(catalog.search_index()),
    }
}

/// Run `params` and keep at most `limit` results.
pub fn search(
    index: &[SearchIndexEntry],
    params: &QueryParams,
    limit: Option<usize>,
) -> Vec<SearchIndexEntry> {
    let mut results = query(index, params);
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    results
}

fn entry_line(entry: &SearchIndexEntry) -> String {
    let title = if entry.title.is_empty() {
        "(untitled)"
    } else {
        entry.title.as_str()
    };
    let mut line = format!("{} / {}  ¥{}", entry.id, title, entry.price);
    if let Some(discount) = entry.discount_percent.filter(|d| *d > 0) {
        line.push_str(&format!(" (-{}%)", discount));
    }
    line
}

pub fn run_search(index: &[SearchIndexEntry], params: &QueryParams, limit: Option<usize>) -> Result<()> {
    let results = search(index, params, limit);
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, entry) in results.iter().enumerate() {
        println!("{}. {}", i + 1, entry_line(entry));
        if !entry.performers.is_empty() {
            println!("    performers: {}", entry.performers.join(", "));
        }
        if !entry.categories.is_empty() {
            println!("    categories: {}", entry.categories.join(", "));
        }
        if !entry.release_date.is_empty() {
            println!("    released: {}", entry.release_date);
        }
        if let Some(rating) = entry.rating {
            println!("    rating: {:.1}", rating);
        }
        if let Some(rank) = entry.ranking_position {
            println!("    rank: #{}", rank);
        }
        if !entry.edition_tags.is_empty() {
            println!("    edition: {}", entry.edition_tags.join(", "));
        }
        println!();
    }
    Ok(())
}

/// `catalog tags`: most frequent categories with their counts.
pub fn run_tags(index: &[SearchIndexEntry], limit: usize) -> Result<()> {
    let tags = tag_frequencies(index, limit);
    if tags.is_empty() {
        println!("No tags.");
        return Ok(());
    }
    for (tag, count) in tags {
        println!("{:>6}  {}", count, tag);
    }
    Ok(())
}
