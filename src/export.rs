//! Export the search index as JSON for client-side search.
//!
//! Produces the compact short-key artifact (`search-index.json`) that a
//! static front end loads and queries locally. The same file can be read
//! back by `catalog search --index` to run queries without the snapshot.

use anyhow::{Context, Result};
use std::path::Path;

use catalog_core::{Catalog, SearchIndexEntry};

use crate::config::Config;

/// Serialize the index. Compact, because the artifact is shipped to clients.
pub fn render_search_index(entries: &[SearchIndexEntry]) -> Result<String> {
    Ok(serde_json::to_string(entries)?)
}

/// Write the catalog's search index.
///
/// If `output` is `Some`, writes to that file path, creating parent
/// directories. Otherwise writes to stdout for piping.
pub fn write_search_index(catalog: &Catalog, output: Option<&Path>) -> Result<usize> {
    let entries = catalog.search_index();
    let json = render_search_index(&entries)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory: {}", parent.display())
                    })?;
                }
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write search index: {}", path.display()))?;
            eprintln!(
                "Exported {} search index entries to {} ({} bytes)",
                entries.len(),
                path.display(),
                json.len()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(entries.len())
}

/// Read a previously exported search index.
///
/// Entries written by older tooling may lack `sale`, `acnt` and `vt`; they
/// deserialize with those fields absent.
pub fn read_search_index(path: &Path) -> Result<Vec<SearchIndexEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read search index: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse search index: {}", path.display()))
}

/// `catalog export`: write to `output`, or to the configured path.
/// An output of `-` writes to stdout.
pub fn run_export(catalog: &Catalog, config: &Config, output: Option<&Path>) -> Result<()> {
    let target = match output {
        Some(path) if path == Path::new("-") => None,
        Some(path) => Some(path),
        None => Some(config.export.search_index_path.as_path()),
    };
    write_search_index(catalog, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{Normalizer, RawRecord};
    use serde_json::json;

    fn catalog() -> Catalog {
        let rows = RawRecord::many_from_value(json!([
            {
                "fanza_product_id": "a",
                "title": "Alpha",
                "actress_names": ["Aoi", "Mei"],
                "genres": ["8KVR"],
                "price": 2000,
                "sale_price": 1000,
                "release_date": "2024-03-01"
            },
            { "fanza_product_id": "b", "title": "Beta", "price": 500 }
        ]));
        Catalog::from_records(&rows, &Normalizer::new())
    }

    #[test]
    fn test_write_and_read_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("public/data/search-index.json");

        let written = write_search_index(&catalog(), Some(&path)).unwrap();
        assert_eq!(written, 2);

        let entries = read_search_index(&path).unwrap();
        assert_eq!(entries, catalog().search_index());
        assert_eq!(entries[0].discount_percent, Some(50));
        assert_eq!(entries[0].edition_tags, vec!["8K".to_string()]);
    }

    #[test]
    fn test_short_keys_on_disk() {
        let json = render_search_index(&catalog().search_index()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value[0];
        assert_eq!(first["id"], "a");
        assert_eq!(first["t"], "Alpha");
        assert_eq!(first["p"], 1000);
        assert_eq!(first["lp"], 2000);
        assert_eq!(first["acnt"], 2);
        assert!(first.get("title").is_none());
    }

    #[test]
    fn test_read_legacy_entry_without_convenience_fields() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"[{"id":"x","t":"Old","ac":["A","B"],"g":[],"mk":"","p":900,"lp":1200,"dr":25,"img":"","rt":null,"rc":null,"rel":"","dur":null,"rk":null}]"#,
        )
        .unwrap();

        let entries = read_search_index(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_on_sale());
        assert_eq!(entries[0].performer_count(), 2);
        assert!(entries[0].edition_tags.is_empty());
    }

    #[test]
    fn test_read_missing_file_has_context() {
        let err = read_search_index(Path::new("/nonexistent/index.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read search index"));
    }
}
