//! Facet aggregation over performers and categories.
//!
//! Each facet value gets an item count and a representative thumbnail (the
//! thumbnail of the first item, in collection order, that carries it).
//! Entries are ordered by count descending; equal counts keep the order in
//! which names were first encountered.
//!
//! A name repeated inside a single item's list counts once for that item, so
//! an entry's `item_count` always equals the number of items listing it.

use std::collections::{HashMap, HashSet};

use crate::model::{FacetEntry, FacetKind, Item};

/// Sorted facet entries plus a name → item-position map.
///
/// Positions index into the item slice the facet was built from, which
/// lets facet pages resolve their members without rescanning.
#[derive(Debug, Clone, Default)]
pub struct FacetIndex {
    entries: Vec<FacetEntry>,
    members: HashMap<String, Vec<usize>>,
}

impl FacetIndex {
    pub fn build(items: &[Item], kind: FacetKind) -> Self {
        let mut first_seen: Vec<(String, String)> = Vec::new();
        let mut members: HashMap<String, Vec<usize>> = HashMap::new();

        for (pos, item) in items.iter().enumerate() {
            let mut in_item: HashSet<&str> = HashSet::new();
            for name in kind.names_of(item) {
                if name.is_empty() || !in_item.insert(name.as_str()) {
                    continue;
                }
                match members.get_mut(name) {
                    Some(positions) => positions.push(pos),
                    None => {
                        members.insert(name.clone(), vec![pos]);
                        first_seen.push((name.clone(), item.thumbnail_url.clone()));
                    }
                }
            }
        }

        let mut entries: Vec<FacetEntry> = first_seen
            .into_iter()
            .map(|(name, thumbnail)| FacetEntry {
                item_count: members.get(&name).map_or(0, Vec::len),
                name,
                representative_thumbnail: thumbnail,
            })
            .collect();

        // Stable: ties stay in first-seen order.
        entries.sort_by(|a, b| b.item_count.cmp(&a.item_count));

        Self { entries, members }
    }

    pub fn entries(&self) -> &[FacetEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&FacetEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Item positions carrying `name`, in collection order.
    pub fn positions(&self, name: &str) -> &[usize] {
        self.members.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Facet lists for both dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSummary {
    pub performers: Vec<FacetEntry>,
    pub categories: Vec<FacetEntry>,
}

/// Aggregate performer and category facets over `items`.
pub fn aggregate(items: &[Item]) -> FacetSummary {
    FacetSummary {
        performers: FacetIndex::build(items, FacetKind::Performer).entries,
        categories: FacetIndex::build(items, FacetKind::Category).entries,
    }
}

/// Items whose `kind` list contains `name`, by linear scan.
pub fn items_with<'a>(items: &'a [Item], kind: FacetKind, name: &str) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| kind.names_of(item).iter().any(|n| n == name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, performers: &[&str], categories: &[&str]) -> Item {
        let mut it = Item::new(id);
        it.thumbnail_url = format!("https://img/{}.jpg", id);
        it.performers = performers.iter().map(|s| s.to_string()).collect();
        it.categories = categories.iter().map(|s| s.to_string()).collect();
        it
    }

    #[test]
    fn test_empty_collection() {
        let summary = aggregate(&[]);
        assert!(summary.performers.is_empty());
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_counts_and_representative_thumbnail() {
        let items = vec![
            item("1", &["Aoi"], &["Drama"]),
            item("2", &["Mei", "Aoi"], &["Drama", "Comedy"]),
            item("3", &["Mei"], &["Comedy"]),
            item("4", &["Aoi"], &[]),
        ];
        let summary = aggregate(&items);

        let aoi = &summary.performers[0];
        assert_eq!(aoi.name, "Aoi");
        assert_eq!(aoi.item_count, 3);
        assert_eq!(aoi.representative_thumbnail, "https://img/1.jpg");

        let mei = &summary.performers[1];
        assert_eq!(mei.item_count, 2);
        assert_eq!(mei.representative_thumbnail, "https://img/2.jpg");
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let items = vec![
            item("1", &[], &["Zeta", "Alpha"]),
            item("2", &[], &["Mid"]),
            item("3", &[], &["Mid", "Alpha", "Zeta"]),
        ];
        let names: Vec<String> = aggregate(&items)
            .categories
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let items = vec![item("1", &["", "Aoi"], &[""])];
        let summary = aggregate(&items);
        assert_eq!(summary.performers.len(), 1);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_count_conservation_with_repeats() {
        let items = vec![
            item("1", &[], &["Drama", "Drama"]),
            item("2", &[], &["Drama"]),
            item("3", &[], &["Comedy"]),
        ];
        let index = FacetIndex::build(&items, FacetKind::Category);
        for entry in index.entries() {
            let scanned = items_with(&items, FacetKind::Category, &entry.name).len();
            assert_eq!(entry.item_count, scanned, "{}", entry.name);
        }
        assert_eq!(index.positions("Drama"), &[0, 1]);
        assert!(index.positions("Missing").is_empty());
    }
}
