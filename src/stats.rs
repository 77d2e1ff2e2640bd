//! Catalog statistics overview.
//!
//! Provides a quick summary of what was loaded: item counts, facet sizes,
//! and the largest facet values. Used by `catalog stats` to give confidence
//! that the snapshot parsed as expected.

use anyhow::Result;

use catalog_core::{Catalog, FacetKind};

use crate::config::Config;

const TOP_FACETS: usize = 5;

fn snapshot_location(config: &Config) -> String {
    match (&config.snapshot.path, &config.snapshot.url) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(url)) => url.clone(),
        (None, None) => "(none)".to_string(),
    }
}

fn percent(part: usize, total: usize) -> usize {
    if total > 0 {
        part * 100 / total
    } else {
        0
    }
}

/// Run the stats command: summarize the catalog and print it.
pub fn run_stats(catalog: &Catalog, config: &Config) -> Result<()> {
    let stats = catalog.stats();

    println!("Media Catalog Stats");
    println!("===================");
    println!();
    println!("  Snapshot:    {}", snapshot_location(config));
    println!();
    println!("  Items:       {}", stats.items);
    println!(
        "  On sale:     {} ({}%)",
        stats.on_sale,
        percent(stats.on_sale, stats.items)
    );
    println!("  Ranked:      {}", stats.ranked);
    println!(
        "  Dated:       {} ({}%)",
        stats.dated,
        percent(stats.dated, stats.items)
    );
    println!("  Performers:  {}", stats.performers);
    println!("  Categories:  {}", stats.categories);

    for kind in [FacetKind::Performer, FacetKind::Category] {
        let top = catalog.facet_list(kind);
        if top.is_empty() {
            continue;
        }
        println!();
        println!("  Top {}:", kind);
        for entry in top.iter().take(TOP_FACETS) {
            println!("    {:<24} {:>6}", entry.name, entry.item_count);
        }
    }

    Ok(())
}
