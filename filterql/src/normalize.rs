use crate::aggregation::AggregationSpec;
use chrono::format::{Item, StrftimeItems};
use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use log::{debug, error, warn};
use serde_json::Value as JsonValue;

/// Ordered bucket-label -> value mapping, built fresh per response.
pub type AggregationResult = IndexMap<String, JsonValue>;

/// The closed set of known result shapes, recognized by structural probing
/// of the opaque aggregation container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggregationShape {
    DateHistogram,
    SingleMetric,
    Terms,
    NumericRange,
    Unrecognized,
}

/// Normalize one aggregation entry out of an opaque response container.
///
/// The container is the raw `aggregations` object of a search response; the
/// entry to flatten is looked up by the spec's derived aggregation key. A
/// missing entry yields `None`, not an error. An entry of unknown shape is
/// passed through raw under the key rather than dropped.
pub fn normalize(container: &JsonValue, spec: &AggregationSpec) -> Option<AggregationResult> {
    let key = spec.key()?;
    let Some(raw) = container.get(&key) else {
        debug!("no aggregation found for key '{}'", key);
        return None;
    };
    let mut results = AggregationResult::new();
    match probe(raw) {
        AggregationShape::DateHistogram => {
            for bucket in buckets(raw) {
                let label = histogram_label(bucket, spec);
                results.insert(label, doc_count(bucket));
            }
        }
        AggregationShape::SingleMetric => {
            let value = raw
                .get("value_as_string")
                .cloned()
                .or_else(|| raw.get("value").cloned())
                .unwrap_or(JsonValue::Null);
            results.insert(key, value);
        }
        AggregationShape::Terms | AggregationShape::NumericRange => {
            for bucket in buckets(raw) {
                results.insert(bucket_label(bucket), doc_count(bucket));
            }
        }
        AggregationShape::Unrecognized => {
            // Lossy escape hatch: surface the raw object under the key.
            error!("unrecognized aggregation result shape for key '{}'", key);
            results.insert(key, raw.clone());
        }
    }
    Some(results)
}

fn probe(raw: &JsonValue) -> AggregationShape {
    if let Some(buckets) = raw.get("buckets").and_then(JsonValue::as_array) {
        let Some(first) = buckets.first() else {
            // An empty bucket list flattens to an empty result either way.
            return AggregationShape::Terms;
        };
        if first.get("key_as_string").is_some() && first.get("key").and_then(JsonValue::as_i64).is_some() {
            return AggregationShape::DateHistogram;
        }
        if first.get("from").is_some() || first.get("to").is_some() {
            return AggregationShape::NumericRange;
        }
        return AggregationShape::Terms;
    }
    if raw.get("value").is_some() || raw.get("value_as_string").is_some() {
        return AggregationShape::SingleMetric;
    }
    AggregationShape::Unrecognized
}

fn buckets(raw: &JsonValue) -> impl Iterator<Item = &JsonValue> {
    raw.get("buckets")
        .and_then(JsonValue::as_array)
        .map(|b| b.iter())
        .into_iter()
        .flatten()
}

fn doc_count(bucket: &JsonValue) -> JsonValue {
    bucket.get("doc_count").cloned().unwrap_or(JsonValue::Null)
}

fn bucket_label(bucket: &JsonValue) -> String {
    if let Some(label) = bucket.get("key_as_string").and_then(JsonValue::as_str) {
        return label.to_string();
    }
    match bucket.get("key") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Histogram bucket label: the engine's date string, optionally reformatted
/// from the epoch-millis key via the spec's `format`.
fn histogram_label(bucket: &JsonValue, spec: &AggregationSpec) -> String {
    let fallback = bucket_label(bucket);
    let Some(format) = spec.format.as_deref().filter(|f| !f.is_empty()) else {
        return fallback;
    };
    let Some(millis) = bucket.get("key").and_then(JsonValue::as_i64) else {
        return fallback;
    };
    // Rendering an invalid specifier panics inside Display, so the format
    // string is checked up front.
    let items: Vec<Item> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        warn!("invalid date format '{}', keeping engine label", format);
        return fallback;
    }
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format_with_items(items.into_iter()).to_string(),
        None => {
            warn!("histogram key {} out of range, keeping engine label", millis);
            fallback
        }
    }
}
