//! Canonical data types shared by every component.
//!
//! [`Item`] is the single normalized shape downstream code ever sees.
//! [`FacetEntry`] and [`SearchIndexEntry`] are derived from items and never
//! stored independently.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One media product after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Stable identifier; unique within a [`Catalog`](crate::Catalog).
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    /// Sample images followed by the sample movie, if any.
    pub sample_media: Vec<String>,
    /// Credited performers in billing order. May be empty.
    pub performers: Vec<String>,
    pub categories: Vec<String>,
    pub maker: String,
    /// `YYYY-MM-DD`, or empty when unknown.
    pub release_date: String,
    /// Minutes; 0 when unknown.
    pub duration_minutes: u32,
    /// 0 when unknown, otherwise within `0.0..=5.0`.
    pub rating: f64,
    pub review_count: u32,
    pub review_comment_count: u32,
    /// Current selling price.
    pub price: u32,
    pub list_price: u32,
    /// Non-zero exactly when `list_price > 0 && price < list_price`.
    pub discount_percent: u32,
    pub campaign_title: Option<String>,
    pub campaign_end: Option<NaiveDateTime>,
    /// Display form of `campaign_end`, e.g. `1/31 23時まで`.
    pub campaign_end_label: Option<String>,
    /// Lower is better. `None` for unranked items.
    pub ranking_position: Option<u32>,
    pub synopsis: String,
    pub editorial: Editorial,
    pub editorial_tags: Vec<String>,
    pub theme_tags: Vec<String>,
    pub situations: Vec<String>,
    pub format_label: String,
    pub supported_devices: Vec<String>,
    pub product_url: String,
}

/// Long-form editorial copy attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Editorial {
    pub review: Option<String>,
    pub summary: Option<String>,
    pub recommend_reason: Option<String>,
    pub appeal_points: Option<String>,
    pub target_audience: Option<String>,
    pub warnings: Option<String>,
}

impl Item {
    /// An item with the given identifier and every other field defaulted.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            thumbnail_url: String::new(),
            sample_media: Vec::new(),
            performers: Vec::new(),
            categories: Vec::new(),
            maker: String::new(),
            release_date: String::new(),
            duration_minutes: 0,
            rating: 0.0,
            review_count: 0,
            review_comment_count: 0,
            price: 0,
            list_price: 0,
            discount_percent: 0,
            campaign_title: None,
            campaign_end: None,
            campaign_end_label: None,
            ranking_position: None,
            synopsis: String::new(),
            editorial: Editorial::default(),
            editorial_tags: Vec::new(),
            theme_tags: Vec::new(),
            situations: Vec::new(),
            format_label: String::new(),
            supported_devices: Vec::new(),
            product_url: String::new(),
        }
    }

    pub fn is_on_sale(&self) -> bool {
        self.discount_percent > 0
    }

    /// Distinct tags used for similarity: categories plus editorial tags.
    pub fn tag_set(&self) -> BTreeSet<&str> {
        self.categories
            .iter()
            .chain(self.editorial_tags.iter())
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// A grouping dimension over items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    Performer,
    Category,
}

impl FacetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetKind::Performer => "performer",
            FacetKind::Category => "category",
        }
    }

    /// The names an item contributes to this facet.
    pub fn names_of<'a>(&self, item: &'a Item) -> &'a [String] {
        match self {
            FacetKind::Performer => &item.performers,
            FacetKind::Category => &item.categories,
        }
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacetKind {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "performer" | "performers" => Ok(FacetKind::Performer),
            "category" | "categories" => Ok(FacetKind::Category),
            other => Err(ParseParamError::new("facet kind", other, "performer, category")),
        }
    }
}

/// Derived summary of one facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetEntry {
    pub name: String,
    pub item_count: usize,
    /// Thumbnail of the first item, in input order, that carries this name.
    pub representative_thumbnail: String,
}

/// Compact projection of an [`Item`] used by the query engine.
///
/// Serialized with short keys so the persisted index stays small. The
/// convenience fields `sale`, `acnt` and `vt` may be missing from artifacts
/// written by older tooling; use [`is_on_sale`](Self::is_on_sale) and
/// [`performer_count`](Self::performer_count), which fall back to the
/// underlying data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexEntry {
    pub id: String,
    #[serde(rename = "t")]
    pub title: String,
    #[serde(rename = "ac", default)]
    pub performers: Vec<String>,
    #[serde(rename = "g", default)]
    pub categories: Vec<String>,
    #[serde(rename = "mk", default)]
    pub maker: String,
    #[serde(rename = "p", default)]
    pub price: u32,
    #[serde(rename = "lp", default)]
    pub list_price: u32,
    #[serde(rename = "dr", default)]
    pub discount_percent: Option<u32>,
    #[serde(rename = "img", default)]
    pub thumbnail_url: String,
    #[serde(rename = "rt", default)]
    pub rating: Option<f64>,
    #[serde(rename = "rc", default)]
    pub review_count: Option<u32>,
    #[serde(rename = "rel", default)]
    pub release_date: String,
    #[serde(rename = "dur", default)]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "rk", default)]
    pub ranking_position: Option<u32>,
    #[serde(rename = "sale", default, skip_serializing_if = "Option::is_none")]
    pub on_sale: Option<bool>,
    #[serde(rename = "acnt", default, skip_serializing_if = "Option::is_none")]
    pub performer_count: Option<u32>,
    #[serde(rename = "vt", default, skip_serializing_if = "Vec::is_empty")]
    pub edition_tags: Vec<String>,
}

impl SearchIndexEntry {
    pub fn is_on_sale(&self) -> bool {
        self.on_sale == Some(true) || self.discount_percent.is_some_and(|d| d > 0)
    }

    pub fn performer_count(&self) -> u32 {
        self.performer_count
            .unwrap_or(self.performers.len() as u32)
    }
}

/// A query or facet parameter that did not match any accepted value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {what}: '{value}'. Use {expected}.")]
pub struct ParseParamError {
    what: &'static str,
    value: String,
    expected: &'static str,
}

impl ParseParamError {
    pub(crate) fn new(what: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            what,
            value: value.to_string(),
            expected,
        }
    }
}
