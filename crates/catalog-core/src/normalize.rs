//! Raw record normalization.
//!
//! [`Normalizer::normalize`] is the only place that knows about the upstream
//! record shapes. It never fails: every field that is missing or cannot be
//! interpreted falls back to a default (`0`, `""`, `[]` or `None`).
//!
//! # Field resolution
//!
//! | Item field | Source fields, first usable wins |
//! |------------|----------------------------------|
//! | `id` | `fanza_product_id`, `content_id`, `id` |
//! | `price` | `sale_price` (if > 0), `price` |
//! | `list_price` | `list_price` (if > 0), `price` |
//! | `rating` | `rating` (if > 0), `review_average` |
//! | `performers` | `actress_names` (if non-empty), `actresses` |
//! | `maker` | `maker_name`, maker directory lookup by `maker_id` |
//!
//! # Discount
//!
//! `discount_percent` is non-zero exactly when `list_price > 0` and
//! `price < list_price`. Within that window an explicit `discount_rate` wins;
//! otherwise it is derived as `round((list - price) / list * 100)`, floored at 1
//! so that a fractional discount still marks the item as on sale.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{Editorial, Item};
use crate::raw::RawRecord;

/// Campaign title attached to records flagged `is_on_sale`.
pub const ON_SALE_CAMPAIGN_TITLE: &str = "セール中";

/// Format label used when a record does not name one.
pub const DEFAULT_FORMAT_LABEL: &str = "VR";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Lookup table from upstream maker ids to display names.
#[derive(Debug, Clone, Default)]
pub struct MakerDirectory {
    names: HashMap<i64, String>,
}

impl MakerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON array of `{ "id": .., "name": .. }` rows.
    ///
    /// Rows without a usable id or name are skipped; a non-array value
    /// produces an empty directory.
    pub fn from_value(value: &Value) -> Self {
        let mut dir = Self::new();
        if let Value::Array(rows) = value {
            for row in rows {
                let id = integer(row.get("id").or_else(|| row.get("maker_id")));
                let name = text(row.get("name").or_else(|| row.get("maker_name")));
                if let (Some(id), Some(name)) = (id, name) {
                    dir.names.entry(id).or_insert(name);
                }
            }
        }
        dir
    }

    pub fn insert(&mut self, id: i64, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Converts [`RawRecord`]s into [`Item`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    makers: MakerDirectory,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_makers(makers: MakerDirectory) -> Self {
        Self { makers }
    }

    pub fn normalize(&self, raw: &RawRecord) -> Item {
        let id = [&raw.product_id, &raw.content_id, &raw.id]
            .into_iter()
            .find_map(|v| text(v.as_ref()))
            .unwrap_or_default();

        let sale_price = parse_price(raw.sale_price.as_ref());
        let base_price = parse_price(raw.price.as_ref());
        let stated_list_price = parse_price(raw.list_price.as_ref());
        let price = if sale_price > 0 { sale_price } else { base_price };
        let list_price = if stated_list_price > 0 {
            stated_list_price
        } else {
            base_price
        };
        let discount_percent = resolve_discount(price, list_price, number(raw.discount_rate.as_ref()));

        let rating = number(raw.rating.as_ref())
            .filter(|r| *r > 0.0)
            .or_else(|| number(raw.review_average.as_ref()))
            .map(|r| r.clamp(0.0, 5.0))
            .unwrap_or(0.0);

        let campaign_end = parse_datetime(raw.sale_end_date.as_ref());
        let campaign_end_label = campaign_end.as_ref().map(format_campaign_end);
        let campaign_title = truthy(raw.is_on_sale.as_ref()).then(|| ON_SALE_CAMPAIGN_TITLE.to_string());

        let mut sample_media = parse_string_list(raw.sample_images.as_ref());
        if let Some(movie) = text(raw.sample_movie_url.as_ref()) {
            sample_media.push(movie);
        }

        let mut performers = parse_string_list(raw.performer_names.as_ref());
        if performers.is_empty() {
            performers = parse_string_list(raw.performers.as_ref());
        }

        let maker = text(raw.maker_name.as_ref())
            .or_else(|| {
                integer(raw.maker_id.as_ref())
                    .and_then(|mid| self.makers.name_of(mid))
                    .map(str::to_string)
            })
            .unwrap_or_default();

        Item {
            id,
            title: text(raw.title.as_ref()).unwrap_or_default(),
            thumbnail_url: text(raw.thumbnail_url.as_ref()).unwrap_or_default(),
            sample_media,
            performers,
            categories: parse_string_list(raw.genres.as_ref()),
            maker,
            release_date: format_release_date(raw.release_date.as_ref()),
            duration_minutes: count(raw.duration_minutes.as_ref()),
            rating,
            review_count: count(raw.review_count.as_ref()),
            review_comment_count: count(raw.review_comment_count.as_ref()),
            price,
            list_price,
            discount_percent,
            campaign_title,
            campaign_end,
            campaign_end_label,
            ranking_position: integer(raw.ranking_position.as_ref())
                .filter(|p| *p > 0)
                .map(|p| p.min(u32::MAX as i64) as u32),
            synopsis: text(raw.description.as_ref()).unwrap_or_default(),
            editorial: Editorial {
                review: text(raw.editorial_review.as_ref()),
                summary: text(raw.editorial_summary.as_ref()),
                recommend_reason: text(raw.editorial_recommend_reason.as_ref()),
                appeal_points: text(raw.editorial_appeal_points.as_ref()),
                target_audience: text(raw.editorial_target_audience.as_ref()),
                warnings: text(raw.editorial_warnings.as_ref()),
            },
            editorial_tags: parse_string_list(raw.editorial_tags.as_ref()),
            theme_tags: parse_string_list(raw.theme_tags.as_ref()),
            situations: parse_string_list(raw.situations.as_ref()),
            format_label: text(raw.format.as_ref())
                .unwrap_or_else(|| DEFAULT_FORMAT_LABEL.to_string()),
            supported_devices: parse_string_list(raw.supported_devices.as_ref()),
            product_url: text(raw.product_url.as_ref()).unwrap_or_default(),
        }
    }
}

/// Normalize with an empty maker directory.
pub fn normalize(raw: &RawRecord) -> Item {
    Normalizer::new().normalize(raw)
}

/// Resolve the discount percent for a price pair.
///
/// `stated` is the upstream `discount_rate`, honored only inside the on-sale
/// window and capped at 100.
pub fn resolve_discount(price: u32, list_price: u32, stated: Option<f64>) -> u32 {
    if list_price == 0 || price >= list_price {
        return 0;
    }
    if let Some(rate) = stated.map(f64::round).filter(|r| *r >= 1.0) {
        return rate.min(100.0) as u32;
    }
    let derived = (f64::from(list_price - price) / f64::from(list_price) * 100.0).round() as u32;
    derived.max(1)
}

/// Parse a price that may be a number or a currency-formatted string.
///
/// Strings yield their first run of ASCII digits (`"¥1980~"` → 1980). A
/// grouping comma ends the run, so `"¥1,980"` → 1. Anything else yields 0.
pub fn parse_price(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| f.round() as u64),
        Some(Value::String(s)) => first_digit_run(s),
        _ => None,
    };
    parsed.map(|p| p.min(u64::from(u32::MAX)) as u32).unwrap_or(0)
}

fn first_digit_run(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let value = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u64, |acc, &b| {
            acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        });
    Some(value)
}

/// Parse a list of strings that may arrive as an array or as a JSON-encoded
/// array inside a string. Anything unparsable yields an empty list.
///
/// Elements are trimmed; empty and non-scalar elements are dropped.
pub fn parse_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| text(Some(v))).collect(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(Value::Array(items)) => items.iter().filter_map(|v| text(Some(v))).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Reformat a date-ish value as zero-padded `YYYY-MM-DD`, or `""`.
pub fn format_release_date(value: Option<&Value>) -> String {
    parse_datetime(value)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Display form of a campaign end, `M/D H時まで`.
pub fn format_campaign_end(end: &NaiveDateTime) -> String {
    format!("{}/{} {}時まで", end.month(), end.day(), end.hour())
}

/// Parse timestamps as the export writes them.
///
/// Offsets are dropped after parsing: the wall-clock time in the record's
/// own offset is kept. Numbers are Unix epochs (milliseconds when larger
/// than 10^11, otherwise seconds) read as UTC.
pub fn parse_datetime(value: Option<&Value>) -> Option<NaiveDateTime> {
    match value? {
        Value::Number(n) => {
            let raw = n.as_f64().filter(|f| f.is_finite())?;
            let dt = if raw.abs() > 1e11 {
                DateTime::from_timestamp_millis(raw as i64)
            } else {
                DateTime::from_timestamp(raw as i64, 0)
            };
            dt.map(|d| d.naive_utc())
        }
        Value::String(s) => parse_datetime_str(s.trim()),
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn integer(value: Option<&Value>) -> Option<i64> {
    number(value).map(|f| f.round() as i64)
}

fn count(value: Option<&Value>) -> u32 {
    integer(value)
        .filter(|n| *n > 0)
        .map(|n| n.min(u32::MAX as i64) as u32)
        .unwrap_or(0)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false")
        }
        _ => false,
    }
}
