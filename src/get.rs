//! Item retrieval by ID.
//!
//! Builds the full detail view for one item: the item itself plus the
//! cross-sell lists shown next to it. Used by both the `catalog get` CLI
//! command and the `GET /items/{id}` HTTP endpoint.

use anyhow::{bail, Result};
use serde::Serialize;

use catalog_core::{Catalog, Item};

/// Where the `related` list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedSource {
    /// Items sharing tags with the viewed item.
    Similar,
    /// No item shared a tag; most popular items instead.
    Popular,
}

/// Detail response for one item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail<'a> {
    pub item: &'a Item,
    pub related: Vec<&'a Item>,
    pub related_source: RelatedSource,
    /// Other items by the first credited performer.
    pub same_performer: Vec<&'a Item>,
}

/// Core get function returning structured data (used by CLI and server).
pub fn get_item_detail<'a>(catalog: &'a Catalog, id: &str, limit: usize) -> Result<ItemDetail<'a>> {
    let Some(item) = catalog.item_by_id(id) else {
        bail!("item not found: {}", id);
    };

    let similar = catalog.similar(item, limit);
    let (related, related_source) = if similar.is_empty() {
        (catalog.popular_fallback(&item.id, limit), RelatedSource::Popular)
    } else {
        (similar, RelatedSource::Similar)
    };

    let same_performer = match item.performers.first() {
        Some(performer) => catalog.items_by_performer_excluding(performer, &item.id, limit),
        None => Vec::new(),
    };

    Ok(ItemDetail {
        item,
        related,
        related_source,
        same_performer,
    })
}

/// One-line summary used by every item listing the CLI prints.
pub fn summary_line(item: &Item) -> String {
    let mut line = format!("{} / {}", item.id, display_title(item));
    if item.is_on_sale() {
        line.push_str(&format!(
            "  ¥{} (was ¥{}, -{}%)",
            item.price, item.list_price, item.discount_percent
        ));
    } else if item.price > 0 {
        line.push_str(&format!("  ¥{}", item.price));
    }
    if item.rating > 0.0 {
        line.push_str(&format!("  ★{:.1}", item.rating));
    }
    line
}

fn display_title(item: &Item) -> &str {
    if item.title.is_empty() {
        "(untitled)"
    } else {
        &item.title
    }
}

/// CLI entry point: print the item and its related lists.
pub fn run_get(catalog: &Catalog, id: &str, limit: usize) -> Result<()> {
    let detail = get_item_detail(catalog, id, limit)?;
    let item = detail.item;

    println!("--- {} ---", item.id);
    println!("title:      {}", display_title(item));
    if !item.performers.is_empty() {
        println!("performers: {}", item.performers.join(", "));
    }
    if !item.categories.is_empty() {
        println!("categories: {}", item.categories.join(", "));
    }
    if !item.maker.is_empty() {
        println!("maker:      {}", item.maker);
    }
    if !item.release_date.is_empty() {
        println!("released:   {}", item.release_date);
    }
    if item.duration_minutes > 0 {
        println!("duration:   {} min", item.duration_minutes);
    }
    println!("format:     {}", item.format_label);
    if item.is_on_sale() {
        println!(
            "price:      ¥{} (list ¥{}, -{}%)",
            item.price, item.list_price, item.discount_percent
        );
    } else {
        println!("price:      ¥{}", item.price);
    }
    if let Some(ref label) = item.campaign_end_label {
        println!("sale ends:  {}", label);
    }
    if item.rating > 0.0 {
        println!("rating:     {:.1} ({} reviews)", item.rating, item.review_count);
    }
    if let Some(rank) = item.ranking_position {
        println!("rank:       #{}", rank);
    }
    if !item.product_url.is_empty() {
        println!("url:        {}", item.product_url);
    }
    if !item.synopsis.is_empty() {
        println!();
        println!("{}", item.synopsis);
    }

    let heading = match detail.related_source {
        RelatedSource::Similar => "Similar items",
        RelatedSource::Popular => "Popular items",
    };
    print_list(heading, &detail.related);
    print_list("Same performer", &detail.same_performer);
    Ok(())
}

fn print_list(heading: &str, items: &[&Item]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}:", heading);
    for item in items {
        println!("  - {}", summary_line(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{Normalizer, RawRecord};
    use serde_json::json;

    fn catalog() -> Catalog {
        let rows = RawRecord::many_from_value(json!([
            { "fanza_product_id": "x", "title": "X", "genres": ["A", "B"], "actress_names": ["Aoi"] },
            { "fanza_product_id": "y", "title": "Y", "genres": ["A"], "actress_names": ["Aoi"] },
            { "fanza_product_id": "lonely", "title": "L", "genres": ["Z"], "ranking_position": 3 },
            { "fanza_product_id": "top", "title": "T", "ranking_position": 1 }
        ]));
        Catalog::from_records(&rows, &Normalizer::new())
    }

    fn ids(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn test_detail_prefers_similar() {
        let catalog = catalog();
        let detail = get_item_detail(&catalog, "x", 4).unwrap();
        assert_eq!(detail.item.id, "x");
        assert_eq!(detail.related_source, RelatedSource::Similar);
        assert_eq!(ids(&detail.related), vec!["y"]);
        assert_eq!(ids(&detail.same_performer), vec!["y"]);
    }

    #[test]
    fn test_detail_falls_back_to_popular() {
        let catalog = catalog();
        let detail = get_item_detail(&catalog, "lonely", 2).unwrap();
        assert_eq!(detail.related_source, RelatedSource::Popular);
        assert_eq!(ids(&detail.related), vec!["top", "x"]);
        assert!(detail.same_performer.is_empty());
    }

    #[test]
    fn test_missing_item() {
        let err = get_item_detail(&catalog(), "nope", 4).unwrap_err();
        assert!(err.to_string().contains("item not found"));
    }

    #[test]
    fn test_summary_line() {
        let mut item = Item::new("a");
        item.title = "Alpha".to_string();
        item.price = 980;
        item.list_price = 1960;
        item.discount_percent = 50;
        item.rating = 4.3;
        assert_eq!(summary_line(&item), "a / Alpha  ¥980 (was ¥1960, -50%)  ★4.3");

        let bare = Item::new("b");
        assert_eq!(summary_line(&bare), "b / (untitled)");
    }
}
