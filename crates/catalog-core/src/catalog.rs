//! The immutable catalog service.
//!
//! A [`Catalog`] is built once from raw records and then only read. It owns
//! the normalized items, an id lookup, and both facet indexes, and exposes
//! every read operation the presentation layer needs. Callers construct one
//! at startup and pass it by reference; there is no hidden global state.
//!
//! # Identifier policy
//!
//! Items are keyed by identifier. Records that normalize to an empty
//! identifier are dropped, and when several records share an identifier the
//! first one wins. Both cases are logged at `warn` level.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::facet::FacetIndex;
use crate::index::build_search_index;
use crate::model::{FacetEntry, FacetKind, Item, SearchIndexEntry};
use crate::normalize::Normalizer;
use crate::rank;
use crate::raw::RawRecord;

/// Read-only item collection with precomputed facets.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    by_id: HashMap<String, usize>,
    performers: FacetIndex,
    categories: FacetIndex,
}

/// Headline counts for a loaded catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CatalogStats {
    pub items: usize,
    pub performers: usize,
    pub categories: usize,
    pub on_sale: usize,
    pub ranked: usize,
    pub dated: usize,
}

impl Catalog {
    /// A catalog with no items. Every query answers empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalize `records` and build the catalog.
    pub fn from_records(records: &[RawRecord], normalizer: &Normalizer) -> Self {
        Self::from_items(records.iter().map(|r| normalizer.normalize(r)).collect())
    }

    /// Build from already-normalized items, applying the identifier policy.
    pub fn from_items(candidates: Vec<Item>) -> Self {
        let total = candidates.len();
        let mut items: Vec<Item> = Vec::with_capacity(total);
        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(total);
        let mut missing_id = 0usize;

        for item in candidates {
            if item.id.is_empty() {
                missing_id += 1;
                continue;
            }
            if by_id.contains_key(&item.id) {
                warn!(id = %item.id, "duplicate item id, keeping first occurrence");
                continue;
            }
            by_id.insert(item.id.clone(), items.len());
            items.push(item);
        }

        if missing_id > 0 {
            warn!(count = missing_id, "skipped records without an identifier");
        }

        let performers = FacetIndex::build(&items, FacetKind::Performer);
        let categories = FacetIndex::build(&items, FacetKind::Category);

        debug!(
            records = total,
            items = items.len(),
            performers = performers.len(),
            categories = categories.len(),
            "catalog built"
        );

        Self {
            items,
            by_id,
            performers,
            categories,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_by_id(&self, id: &str) -> Option<&Item> {
        self.by_id.get(id).map(|&pos| &self.items[pos])
    }

    fn facet(&self, kind: FacetKind) -> &FacetIndex {
        match kind {
            FacetKind::Performer => &self.performers,
            FacetKind::Category => &self.categories,
        }
    }

    /// Facet entries for `kind`, largest first.
    pub fn facet_list(&self, kind: FacetKind) -> &[FacetEntry] {
        self.facet(kind).entries()
    }

    pub fn facet_entry(&self, kind: FacetKind, name: &str) -> Option<&FacetEntry> {
        self.facet(kind).entry(name)
    }

    /// Items carrying `name` in the `kind` facet, in collection order.
    pub fn items_by_facet(&self, kind: FacetKind, name: &str) -> Vec<&Item> {
        self.facet(kind)
            .positions(name)
            .iter()
            .map(|&pos| &self.items[pos])
            .collect()
    }

    pub fn items_by_performer(&self, name: &str) -> Vec<&Item> {
        self.items_by_facet(FacetKind::Performer, name)
    }

    pub fn items_by_category(&self, name: &str) -> Vec<&Item> {
        self.items_by_facet(FacetKind::Category, name)
    }

    pub fn ranked(&self) -> Vec<&Item> {
        rank::ranked(&self.items)
    }

    pub fn on_sale(&self) -> Vec<&Item> {
        rank::on_sale(&self.items)
    }

    pub fn by_rating_threshold(&self, min_rating: f64, limit: usize) -> Vec<&Item> {
        rank::by_rating_threshold(&self.items, min_rating, limit)
    }

    pub fn by_price_ceiling(&self, max_price: u32, limit: usize) -> Vec<&Item> {
        rank::by_price_ceiling(&self.items, max_price, limit)
    }

    pub fn newest(&self, limit: usize) -> Vec<&Item> {
        rank::newest(&self.items, limit)
    }

    pub fn similar(&self, reference: &Item, limit: usize) -> Vec<&Item> {
        rank::similar(&self.items, reference, limit)
    }

    pub fn similar_scored(&self, reference: &Item, limit: usize) -> Vec<rank::Scored<'_>> {
        rank::similar_scored(&self.items, reference, limit)
    }

    pub fn popular_fallback(&self, exclude_id: &str, limit: usize) -> Vec<&Item> {
        rank::popular_fallback(&self.items, exclude_id, limit)
    }

    pub fn category_ranked(&self, category: &str, limit: usize) -> Vec<&Item> {
        rank::category_ranked(&self.items, category, limit)
    }

    pub fn items_by_performer_excluding(
        &self,
        performer: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Vec<&Item> {
        rank::by_performer_excluding(&self.items, performer, exclude_id, limit)
    }

    /// Project every item into the compact search index.
    pub fn search_index(&self) -> Vec<SearchIndexEntry> {
        build_search_index(&self.items)
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            items: self.items.len(),
            performers: self.performers.len(),
            categories: self.categories.len(),
            on_sale: self.items.iter().filter(|i| i.is_on_sale()).count(),
            ranked: self
                .items
                .iter()
                .filter(|i| i.ranking_position.is_some())
                .count(),
            dated: self
                .items
                .iter()
                .filter(|i| !i.release_date.is_empty())
                .count(),
        }
    }
}
