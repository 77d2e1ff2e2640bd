//! # Media Catalog
//!
//! Normalization, facet browsing, ranking views, and faceted search for a
//! media product catalog.
//!
//! A snapshot of raw product records (exported by an upstream warehouse or
//! product feed) is loaded once, normalized into canonical items, and served
//! read-only through a CLI and an HTTP API. The compact search index can also
//! be exported for client-side search on a static site.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Snapshot   │──▶│  Normalizer  │──▶│   Catalog    │
//! │ file / HTTP │   │ (core crate) │   │ items+facets │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                  ┌──────────────────┬───────┴──────────┐
//!                  ▼                  ▼                  ▼
//!             ┌──────────┐      ┌──────────┐      ┌─────────────┐
//!             │   CLI    │      │   HTTP   │      │ search-index│
//!             │(catalog) │      │  (axum)  │      │    .json    │
//!             └──────────┘      └──────────┘      └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! catalog stats                      # what was loaded
//! catalog facets performer --limit 20
//! catalog view sale
//! catalog search "beach" --on-sale --sort discount
//! catalog export                     # write public/data/search-index.json
//! catalog serve                      # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`snapshot`] | Snapshot sources and the load-once cache |
//! | [`get`] | Item detail with related lists |
//! | [`facets`] | Facet listings and facet pages |
//! | [`views`] | Fixed views and similar items |
//! | [`search`] | Faceted search and popular tags |
//! | [`stats`] | Catalog summary |
//! | [`export`] | Search index artifact |
//! | [`server`] | HTTP API |
//!
//! The pure logic lives in the [`catalog_core`] crate, re-exported here.

pub mod config;
pub mod export;
pub mod facets;
pub mod get;
pub mod search;
pub mod server;
pub mod snapshot;
pub mod stats;
pub mod views;

pub use catalog_core;
