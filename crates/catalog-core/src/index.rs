//! Search index projection.
//!
//! Items are projected once into [`SearchIndexEntry`] records: short field
//! names for transfer, nullable numerics where "unknown" should stay
//! distinguishable from zero, and three precomputed convenience fields.

use crate::model::{Item, SearchIndexEntry};

/// Category substrings and the edition tag each one implies.
///
/// Checked in order; each tag is emitted at most once.
pub const EDITION_MARKERS: &[(&str, &str)] = &[
    ("8K", "8K"),
    ("8k", "8K"),
    ("ハイクオリティ", "HQ"),
    ("高画質", "HQ"),
    ("HQ", "HQ"),
    ("単体", "単体"),
];

/// Best-effort edition classifier.
///
/// Categories are free text, so this is a substring heuristic rather than a
/// controlled vocabulary: a category such as "8Kではない" still yields `8K`
/// (false positive), and an item whose quality is only mentioned in its
/// title yields nothing (false negative). No invariant depends on its output.
pub fn classify_edition(categories: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for (marker, tag) in EDITION_MARKERS {
        if tags.iter().any(|t| t == tag) {
            continue;
        }
        if categories.iter().any(|c| c.contains(marker)) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Project one item.
pub fn project(item: &Item) -> SearchIndexEntry {
    SearchIndexEntry {
        id: item.id.clone(),
        title: item.title.clone(),
        performers: item.performers.clone(),
        categories: item.categories.clone(),
        maker: item.maker.clone(),
        price: item.price,
        list_price: item.list_price,
        discount_percent: positive(item.discount_percent),
        thumbnail_url: item.thumbnail_url.clone(),
        rating: (item.rating > 0.0).then_some(item.rating),
        review_count: positive(item.review_count),
        release_date: item.release_date.clone(),
        duration_minutes: positive(item.duration_minutes),
        ranking_position: item.ranking_position,
        on_sale: Some(item.is_on_sale()),
        // Uncredited works count as single-performer works for filtering.
        performer_count: Some((item.performers.len() as u32).max(1)),
        edition_tags: classify_edition(&item.categories),
    }
}

/// Project every item, preserving collection order.
pub fn build_search_index(items: &[Item]) -> Vec<SearchIndexEntry> {
    items.iter().map(project).collect()
}

fn positive(n: u32) -> Option<u32> {
    (n > 0).then_some(n)
}
