//! Loosely-typed records as delivered by the upstream export.
//!
//! The export has gone through several historical shapes. Rather than one
//! struct per shape, [`RawRecord`] carries the union of every known field as
//! an untyped [`serde_json::Value`]: a field may be absent, `null`, a number,
//! a numeric string, a currency string, or a JSON-encoded array inside a
//! string. All interpretation happens in [`crate::normalize`].

use serde::Deserialize;
use serde_json::Value;

/// One upstream row. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    // Identifiers: warehouse shape, feed shape, surrogate key.
    #[serde(rename = "fanza_product_id")]
    pub product_id: Option<Value>,
    pub content_id: Option<Value>,
    pub id: Option<Value>,

    pub title: Option<Value>,
    pub thumbnail_url: Option<Value>,
    #[serde(rename = "fanza_url")]
    pub product_url: Option<Value>,
    pub sample_images: Option<Value>,
    pub sample_movie_url: Option<Value>,
    pub description: Option<Value>,
    pub release_date: Option<Value>,
    pub duration_minutes: Option<Value>,
    #[serde(rename = "vr_type")]
    pub format: Option<Value>,
    pub supported_devices: Option<Value>,

    // Pricing. In the warehouse shape `price` is the list price and
    // `sale_price` the current one; the feed shape uses `price`/`list_price`.
    pub price: Option<Value>,
    pub sale_price: Option<Value>,
    pub list_price: Option<Value>,
    pub discount_rate: Option<Value>,
    pub sale_end_date: Option<Value>,
    pub is_on_sale: Option<Value>,

    pub ranking_position: Option<Value>,
    pub rating: Option<Value>,
    pub review_average: Option<Value>,
    pub review_count: Option<Value>,
    pub review_comment_count: Option<Value>,

    #[serde(rename = "ai_review")]
    pub editorial_review: Option<Value>,
    #[serde(rename = "ai_summary")]
    pub editorial_summary: Option<Value>,
    #[serde(rename = "ai_recommend_reason")]
    pub editorial_recommend_reason: Option<Value>,
    #[serde(rename = "ai_appeal_points")]
    pub editorial_appeal_points: Option<Value>,
    #[serde(rename = "ai_target_audience")]
    pub editorial_target_audience: Option<Value>,
    #[serde(rename = "ai_warnings")]
    pub editorial_warnings: Option<Value>,
    #[serde(rename = "ai_tags")]
    pub editorial_tags: Option<Value>,

    #[serde(rename = "actress_names")]
    pub performer_names: Option<Value>,
    #[serde(rename = "actresses")]
    pub performers: Option<Value>,
    pub genres: Option<Value>,
    #[serde(rename = "fetish_tags")]
    pub theme_tags: Option<Value>,
    pub situations: Option<Value>,

    pub maker_id: Option<Value>,
    pub maker_name: Option<Value>,
}

impl RawRecord {
    /// Interpret an arbitrary JSON value as a record.
    ///
    /// Anything that is not an object (or that carries a key twice) becomes
    /// an empty record, which normalizes to an item without an identifier.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Interpret every element of a JSON array as a record.
    ///
    /// A non-array value yields no records.
    pub fn many_from_value(value: Value) -> Vec<Self> {
        match value {
            Value::Array(rows) => rows.into_iter().map(Self::from_value).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_fields_are_captured() {
        let raw = RawRecord::from_value(json!({
            "fanza_product_id": "abc00001",
            "sale_price": "1,980円",
            "actress_names": "[\"A\"]",
            "unrelated": 42
        }));
        assert_eq!(raw.product_id, Some(json!("abc00001")));
        assert_eq!(raw.sale_price, Some(json!("1,980円")));
        assert_eq!(raw.performer_names, Some(json!("[\"A\"]")));
    }

    #[test]
    fn test_null_is_absent() {
        let raw = RawRecord::from_value(json!({ "title": null }));
        assert!(raw.title.is_none());
    }

    #[test]
    fn test_non_object_becomes_empty_record() {
        let raw = RawRecord::from_value(json!("not a record"));
        assert!(raw.product_id.is_none());
        assert!(raw.title.is_none());
    }

    #[test]
    fn test_many_from_non_array_is_empty() {
        assert!(RawRecord::many_from_value(json!({ "rows": [] })).is_empty());
        assert_eq!(RawRecord::many_from_value(json!([{}, {}])).len(), 2);
    }
}
