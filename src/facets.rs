//! Facet listing and facet pages.
//!
//! Used by `catalog facets` and the `/facets/{kind}` endpoints.

use anyhow::{bail, Result};
use serde::Serialize;

use catalog_core::{Catalog, FacetEntry, FacetKind, Item};

use crate::get::summary_line;

/// Facet entries for `kind`, largest first, optionally capped.
pub fn facet_list(catalog: &Catalog, kind: FacetKind, limit: Option<usize>) -> &[FacetEntry] {
    let entries = catalog.facet_list(kind);
    match limit {
        Some(limit) => &entries[..limit.min(entries.len())],
        None => entries,
    }
}

/// One facet value and the items carrying it.
#[derive(Debug, Clone, Serialize)]
pub struct FacetPage<'a> {
    pub kind: FacetKind,
    pub entry: &'a FacetEntry,
    pub items: Vec<&'a Item>,
}

pub fn facet_page<'a>(
    catalog: &'a Catalog,
    kind: FacetKind,
    name: &str,
    limit: Option<usize>,
) -> Result<FacetPage<'a>> {
    let Some(entry) = catalog.facet_entry(kind, name) else {
        bail!("{} not found: {}", kind, name);
    };
    let mut items = catalog.items_by_facet(kind, name);
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    Ok(FacetPage { kind, entry, items })
}

/// CLI entry point. Without `name`, lists facet values; with it, lists the
/// items under that value.
pub fn run_facets(
    catalog: &Catalog,
    kind: FacetKind,
    name: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    if let Some(name) = name {
        let page = facet_page(catalog, kind, name, limit)?;
        println!("{} ({} items)", page.entry.name, page.entry.item_count);
        for (i, item) in page.items.iter().enumerate() {
            println!("{}. {}", i + 1, summary_line(item));
        }
        return Ok(());
    }

    let entries = facet_list(catalog, kind, limit);
    if entries.is_empty() {
        println!("No {} facets.", kind);
        return Ok(());
    }
    println!("{:>6}  {}", "ITEMS", kind.as_str().to_uppercase());
    for entry in entries {
        println!("{:>6}  {}", entry.item_count, entry.name);
    }
    Ok(())
}
