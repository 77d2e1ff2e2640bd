//! # Media Catalog CLI (`catalog`)
//!
//! The `catalog` binary loads the configured snapshot and answers catalog
//! queries from the command line, exports the client-side search index, or
//! serves the catalog over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! catalog --config ./config/catalog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog stats` | Summarize the loaded catalog |
//! | `catalog get <id>` | Show one item with related items |
//! | `catalog facets <kind> [name]` | List performers or categories, or one facet page |
//! | `catalog view <view>` | Show a fixed view (`ranked`, `sale`, `top-rated`, ...) |
//! | `catalog similar <id>` | Items sharing the most tags with an item |
//! | `catalog search [query]` | Faceted search over the compact index |
//! | `catalog tags` | Most frequent categories |
//! | `catalog export` | Write the search index artifact |
//! | `catalog serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Solo works on sale under ¥1000, biggest discount first
//! catalog search --on-sale --performers solo --max-price 1000 --sort discount
//!
//! # Query a previously exported index without loading the snapshot
//! catalog search "beach" --index public/data/search-index.json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use media_catalog::catalog_core::{
    Catalog, FacetKind, PerformerCountFilter, QueryParams, SortOrder,
};
use media_catalog::config::{self, Config};
use media_catalog::snapshot::{build_catalog, SnapshotCache};
use media_catalog::views::View;
use media_catalog::{export, facets, get, search, server, stats, views};

/// Media Catalog CLI: normalization, facet browsing, and faceted search over
/// a product snapshot.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/catalog.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "catalog",
    about = "Media Catalog: facet browsing and faceted search over a product snapshot",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/catalog.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the loaded catalog.
    Stats,

    /// Show one item with its similar (or popular) and same-performer items.
    Get {
        id: String,

        /// Size of each related list. Defaults to `catalog.related_limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List facet values, or the items under one value.
    Facets {
        /// `performer` or `category`.
        kind: FacetKind,

        /// Show the items carrying this value instead of the value list.
        name: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a fixed view: ranked, sale, top-rated, bargain, newest, popular.
    View {
        view: View,

        /// Overrides the configured cap for this view.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Items sharing the most tags with an item, with their scores.
    Similar {
        id: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search the compact index.
    ///
    /// Every whitespace-separated term must appear in the title, performers,
    /// categories, or maker. Filters combine with AND.
    Search {
        /// Free text. Omit to list everything that passes the filters.
        query: Option<String>,

        /// Only discounted items.
        #[arg(long)]
        on_sale: bool,

        /// Performer count: `all`, `solo`, or `multi`.
        #[arg(long, default_value = "all")]
        performers: PerformerCountFilter,

        /// Inclusive price ceiling.
        #[arg(long)]
        max_price: Option<u32>,

        /// Required category. Repeat for several; all must match.
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// `new`, `rank`, `rating`, `discount`, or `price`.
        #[arg(long, default_value = "new")]
        sort: SortOrder,

        #[arg(long)]
        limit: Option<usize>,

        /// Query an exported search index file instead of the snapshot.
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Most frequent categories.
    Tags {
        /// Defaults to `catalog.popular_tags_limit`.
        #[arg(long)]
        limit: Option<usize>,

        /// Count over an exported search index file instead of the snapshot.
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Write the search index artifact.
    Export {
        /// Output path. Defaults to `export.search_index_path`; `-` for stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP server on `server.bind`.
    Serve,
}

/// Whether the command reads only an exported index and needs neither a
/// config file nor the snapshot.
fn index_only(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Search { index: Some(_), .. } | Commands::Tags { index: Some(_), .. }
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (cfg, catalog) = if index_only(&cli.command) {
        // Use config if available, otherwise a minimal default
        let cfg = config::load_config(&cli.config).unwrap_or_else(|_| Config::minimal());
        (cfg, Catalog::empty())
    } else {
        let cfg = config::load_config(&cli.config)?;
        let catalog = build_catalog(&cfg, &SnapshotCache::new()).await?;
        (cfg, catalog)
    };
    debug!(items = catalog.len(), "dispatching command");

    match cli.command {
        Commands::Stats => {
            stats::run_stats(&catalog, &cfg)?;
        }
        Commands::Get { id, limit } => {
            get::run_get(&catalog, &id, limit.unwrap_or(cfg.catalog.related_limit))?;
        }
        Commands::Facets { kind, name, limit } => {
            facets::run_facets(&catalog, kind, name.as_deref(), limit)?;
        }
        Commands::View { view, limit } => {
            views::run_view(&catalog, view, &cfg.catalog, limit)?;
        }
        Commands::Similar { id, limit } => {
            views::run_similar(&catalog, &id, limit.unwrap_or(cfg.catalog.related_limit))?;
        }
        Commands::Search {
            query,
            on_sale,
            performers,
            max_price,
            tags,
            sort,
            limit,
            index,
        } => {
            let entries = search::load_index(&catalog, index.as_deref())?;
            let params = QueryParams {
                text: query.unwrap_or_default(),
                on_sale_only: on_sale,
                performer_count: performers,
                max_price,
                required_tags: tags,
                sort,
            };
            search::run_search(&entries, &params, limit)?;
        }
        Commands::Tags { limit, index } => {
            let entries = search::load_index(&catalog, index.as_deref())?;
            search::run_tags(&entries, limit.unwrap_or(cfg.catalog.popular_tags_limit))?;
        }
        Commands::Export { output } => {
            export::run_export(&catalog, &cfg, output.as_deref())?;
        }
        Commands::Serve => {
            server::run_server(catalog, &cfg).await?;
        }
    }

    Ok(())
}
