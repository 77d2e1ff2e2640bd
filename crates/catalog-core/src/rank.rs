//! Ranking views and recommendations over the canonical item collection.
//!
//! Every function borrows from the input slice and returns a fresh list of
//! references; nothing here reorders or mutates the collection itself. All
//! sorts are stable, so items that compare equal keep collection order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::model::Item;

/// Items with an explicit ranking position, best position first.
pub fn ranked(items: &[Item]) -> Vec<&Item> {
    let mut out: Vec<&Item> = items
        .iter()
        .filter(|i| i.ranking_position.is_some())
        .collect();
    out.sort_by_key(|i| i.ranking_position);
    out
}

/// Items currently discounted, in collection order.
pub fn on_sale(items: &[Item]) -> Vec<&Item> {
    items.iter().filter(|i| i.is_on_sale()).collect()
}

/// Items rated at least `min_rating`, highest first, at most `limit`.
pub fn by_rating_threshold(items: &[Item], min_rating: f64, limit: usize) -> Vec<&Item> {
    let mut out: Vec<&Item> = items.iter().filter(|i| i.rating >= min_rating).collect();
    out.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));
    out.truncate(limit);
    out
}

/// Priced items at or below `max_price`, cheapest first, at most `limit`.
pub fn by_price_ceiling(items: &[Item], max_price: u32, limit: usize) -> Vec<&Item> {
    let mut out: Vec<&Item> = items
        .iter()
        .filter(|i| i.price > 0 && i.price <= max_price)
        .collect();
    out.sort_by_key(|i| i.price);
    out.truncate(limit);
    out
}

/// Items with a known release date, most recent first, at most `limit`.
pub fn newest(items: &[Item], limit: usize) -> Vec<&Item> {
    let mut out: Vec<&Item> = items
        .iter()
        .filter(|i| !i.release_date.is_empty())
        .collect();
    out.sort_by(|a, b| b.release_date.cmp(&a.release_date));
    out.truncate(limit);
    out
}

/// Popularity comparator used for cross-sell lists.
///
/// Ranked items precede unranked ones; two ranked items compare by position
/// ascending; two unranked items compare by rating descending.
pub fn popularity_order(a: &Item, b: &Item) -> Ordering {
    match (a.ranking_position, b.ranking_position) {
        (Some(ra), Some(rb)) => ra.cmp(&rb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal),
    }
}

/// Most popular items other than `exclude_id`, at most `limit`.
pub fn popular_fallback<'a>(items: &'a [Item], exclude_id: &str, limit: usize) -> Vec<&'a Item> {
    let mut out: Vec<&Item> = items.iter().filter(|i| i.id != exclude_id).collect();
    out.sort_by(|a, b| popularity_order(a, b));
    out.truncate(limit);
    out
}

/// Items in `category`, ordered by [`popularity_order`], at most `limit`.
pub fn category_ranked<'a>(items: &'a [Item], category: &str, limit: usize) -> Vec<&'a Item> {
    let mut out: Vec<&Item> = items
        .iter()
        .filter(|i| i.categories.iter().any(|c| c == category))
        .collect();
    out.sort_by(|a, b| popularity_order(a, b));
    out.truncate(limit);
    out
}

/// Other items featuring `performer`, in collection order, at most `limit`.
pub fn by_performer_excluding<'a>(
    items: &'a [Item],
    performer: &str,
    exclude_id: &str,
    limit: usize,
) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|i| i.id != exclude_id && i.performers.iter().any(|p| p == performer))
        .take(limit)
        .collect()
}

/// An item paired with its shared-tag count against a reference item.
#[derive(Debug, Clone, Copy)]
pub struct Scored<'a> {
    pub item: &'a Item,
    pub score: usize,
}

/// Number of distinct tags two tag sets share.
pub fn shared_tag_count(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> usize {
    a.intersection(b).count()
}

/// Items sharing at least one tag with `reference`, most shared first.
///
/// Tags are the union of categories and editorial tags. The reference item
/// itself is never returned. Equal scores keep collection order.
pub fn similar_scored<'a>(items: &'a [Item], reference: &Item, limit: usize) -> Vec<Scored<'a>> {
    let reference_tags = reference.tag_set();
    if reference_tags.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<Scored<'a>> = items
        .iter()
        .filter(|i| i.id != reference.id)
        .map(|i| Scored {
            item: i,
            score: shared_tag_count(&reference_tags, &i.tag_set()),
        })
        .filter(|s| s.score > 0)
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// [`similar_scored`] without the scores.
pub fn similar<'a>(items: &'a [Item], reference: &Item, limit: usize) -> Vec<&'a Item> {
    similar_scored(items, reference, limit)
        .into_iter()
        .map(|s| s.item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item::new(id)
    }

    fn ids(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.id.clone()).collect()
    }

    fn tagged(id: &str, tags: &[&str]) -> Item {
        let mut it = item(id);
        it.categories = tags.iter().map(|t| t.to_string()).collect();
        it
    }

    #[test]
    fn test_ranked_ascending() {
        let mut a = item("a");
        a.ranking_position = Some(5);
        let b = item("b");
        let mut c = item("c");
        c.ranking_position = Some(1);
        let items = vec![a, b, c];
        assert_eq!(ids(&ranked(&items)), vec!["c", "a"]);
    }

    #[test]
    fn test_on_sale_filter() {
        let mut a = item("a");
        a.discount_percent = 20;
        let items = vec![a, item("b")];
        assert_eq!(ids(&on_sale(&items)), vec!["a"]);
    }

    #[test]
    fn test_rating_threshold_sorted_and_capped() {
        let ratings = [("a", 4.5), ("b", 3.0), ("c", 4.9), ("d", 4.7)];
        let items: Vec<Item> = ratings
            .iter()
            .map(|(id, r)| {
                let mut it = item(id);
                it.rating = *r;
                it
            })
            .collect();
        assert_eq!(ids(&by_rating_threshold(&items, 4.5, 2)), vec!["c", "d"]);
        assert_eq!(ids(&by_rating_threshold(&items, 4.5, 10)), vec!["c", "d", "a"]);
    }

    #[test]
    fn test_price_ceiling_is_inclusive() {
        let prices = [("a", 500), ("b", 0), ("c", 300), ("d", 501)];
        let items: Vec<Item> = prices
            .iter()
            .map(|(id, p)| {
                let mut it = item(id);
                it.price = *p;
                it
            })
            .collect();
        assert_eq!(ids(&by_price_ceiling(&items, 500, 12)), vec!["c", "a"]);
    }

    #[test]
    fn test_newest_skips_undated() {
        let dates = [("a", "2024-01-01"), ("b", ""), ("c", "2024-03-01")];
        let items: Vec<Item> = dates
            .iter()
            .map(|(id, d)| {
                let mut it = item(id);
                it.release_date = d.to_string();
                it
            })
            .collect();
        assert_eq!(ids(&newest(&items, 12)), vec!["c", "a"]);
    }

    #[test]
    fn test_popular_fallback_total_order() {
        let mut r1 = item("r1");
        r1.ranking_position = Some(1);
        let mut r5 = item("r5");
        r5.ranking_position = Some(5);
        let mut unranked = item("u");
        unranked.rating = 4.8;

        let orders = [
            vec![r1.clone(), r5.clone(), unranked.clone()],
            vec![unranked.clone(), r5.clone(), r1.clone()],
            vec![r5.clone(), unranked.clone(), r1.clone()],
        ];
        for items in &orders {
            assert_eq!(ids(&popular_fallback(items, "", 10)), vec!["r1", "r5", "u"]);
        }
    }

    #[test]
    fn test_popular_fallback_rating_and_exclusion() {
        let mut a = item("a");
        a.rating = 3.0;
        let mut b = item("b");
        b.rating = 4.0;
        let mut c = item("c");
        c.rating = 5.0;
        let items = vec![a, b, c];
        assert_eq!(ids(&popular_fallback(&items, "c", 4)), vec!["b", "a"]);
    }

    #[test]
    fn test_category_ranked() {
        let mut a = tagged("a", &["Drama"]);
        a.rating = 4.0;
        let mut b = tagged("b", &["Drama"]);
        b.ranking_position = Some(9);
        let c = tagged("c", &["Comedy"]);
        let items = vec![a, b, c];
        assert_eq!(ids(&category_ranked(&items, "Drama", 12)), vec!["b", "a"]);
    }

    #[test]
    fn test_by_performer_excluding() {
        let mut a = item("a");
        a.performers = vec!["Aoi".into()];
        let mut b = item("b");
        b.performers = vec!["Mei".into(), "Aoi".into()];
        let mut c = item("c");
        c.performers = vec!["Aoi".into()];
        let items = vec![a, b, c];
        assert_eq!(ids(&by_performer_excluding(&items, "Aoi", "a", 4)), vec!["b", "c"]);
        assert_eq!(ids(&by_performer_excluding(&items, "Aoi", "a", 1)), vec!["b"]);
    }

    #[test]
    fn test_similarity_example() {
        let x = tagged("x", &["A", "B", "C"]);
        let y = tagged("y", &["B", "C", "D"]);
        let z = tagged("z", &["D", "E"]);
        let items = vec![x.clone(), y, z];

        let scored = similar_scored(&items, &x, 4);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].item.id, "y");
        assert_eq!(scored[0].score, 2);
    }

    #[test]
    fn test_similarity_counts_editorial_tags_once() {
        let mut x = tagged("x", &["A", "B"]);
        x.editorial_tags = vec!["A".into(), "Slow".into()];
        let mut y = tagged("y", &["A"]);
        y.editorial_tags = vec!["A".into(), "Slow".into()];
        let w = tagged("w", &["B"]);
        let items = vec![x.clone(), w, y];

        let scored = similar_scored(&items, &x, 4);
        let pairs: Vec<(&str, usize)> = scored.iter().map(|s| (s.item.id.as_str(), s.score)).collect();
        assert_eq!(pairs, vec![("y", 2), ("w", 1)]);
    }

    #[test]
    fn test_similarity_ties_keep_collection_order() {
        let x = tagged("x", &["A"]);
        let items = vec![tagged("p", &["A"]), x.clone(), tagged("q", &["A"])];
        assert_eq!(ids(&similar(&items, &x, 4)), vec!["p", "q"]);
    }

    #[test]
    fn test_similarity_without_tags_is_empty() {
        let x = item("x");
        let items = vec![x.clone(), tagged("y", &["A"])];
        assert!(similar(&items, &x, 4).is_empty());
    }
}
