//! # Media Catalog Core
//!
//! Pure, I/O-free logic for Media Catalog: raw record normalization, facet
//! aggregation, ranking and recommendation views, search index projection,
//! and the query engine.
//!
//! This crate contains no tokio, filesystem, or network dependencies. Every
//! function here operates on data that is already in memory, and none of them
//! fail: malformed input degrades to documented defaults and lookups that
//! match nothing return empty results.
//!
//! ## Data Flow
//!
//! ```text
//! RawRecord ──▶ Normalizer ──▶ Item ──┬──▶ FacetIndex ──▶ FacetEntry lists
//!                                    ├──▶ rank::*     ──▶ detail-page views
//!                                    └──▶ index::*    ──▶ SearchIndexEntry ──▶ query::query
//! ```
//!
//! [`catalog::Catalog`] ties the pieces together into one immutable service
//! object that callers construct once and pass around by reference.

pub mod catalog;
pub mod facet;
pub mod index;
pub mod model;
pub mod normalize;
pub mod query;
pub mod rank;
pub mod raw;

pub use catalog::{Catalog, CatalogStats};
pub use facet::{aggregate, FacetIndex, FacetSummary};
pub use index::{build_search_index, classify_edition, project};
pub use model::{Editorial, FacetEntry, FacetKind, Item, ParseParamError, SearchIndexEntry};
pub use normalize::{normalize, MakerDirectory, Normalizer};
pub use query::{popular_tags, query, PerformerCountFilter, QueryParams, SortOrder};
pub use raw::RawRecord;
