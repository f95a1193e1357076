use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Declarative aggregation request as received from a caller.
///
/// `ranges` and `values` carry JSON-array-encoded strings, matching the wire
/// convention of the filter DSL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregationSpec {
    pub aggre_type: String,
    pub field_type: Option<String>,
    pub field_name: String,
    pub interval: Option<String>,
    pub ranges: Option<String>,
    pub values: Option<String>,
    pub locale: Option<String>,
    pub format: Option<String>,
}

impl AggregationSpec {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The derived aggregation key: `aggreType_fieldName[_interval]`.
    ///
    /// Must be unique per request; it is the only handle used to retrieve
    /// the matching result bucket afterwards.
    pub fn key(&self) -> Option<String> {
        if self.aggre_type.is_empty() || self.field_name.is_empty() {
            return None;
        }
        let mut key = format!("{}_{}", self.aggre_type, self.field_name);
        if let Some(interval) = self.interval.as_deref() {
            if !interval.is_empty() {
                key.push('_');
                key.push_str(interval);
            }
        }
        Some(key)
    }

    /// Compile into an aggregation request, or `None` when the type is
    /// unrecognized or the spec is incomplete. Callers must treat `None` as
    /// "no aggregation", not an error.
    pub fn compile(&self, terms_bucket_cap: Option<u32>) -> Option<AggregationRequest> {
        let key = self.key()?;
        match self.aggre_type.as_str() {
            "count" => Some(self.compile_count(key)),
            "terms" => Some(AggregationRequest::Terms {
                key,
                field: self.field_name.clone(),
                include: self.parse_values(),
                cap: terms_bucket_cap,
            }),
            "avg" | "min" | "max" | "sum" => Some(AggregationRequest::Metric {
                key,
                kind: self.aggre_type.parse().ok()?,
                field: self.field_name.clone(),
                format: self.format.clone(),
            }),
            "ranges" => Some(AggregationRequest::NumericRanges {
                key,
                field: self.field_name.clone(),
                ranges: self.parse_ranges(),
                format: self.format.clone(),
            }),
            other => {
                warn!("unrecognized aggregation type '{}', no aggregation attached", other);
                None
            }
        }
    }

    fn compile_count(&self, key: String) -> AggregationRequest {
        let is_date = self
            .field_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("date"));
        match (is_date, self.interval.as_deref()) {
            (true, Some(interval)) if !interval.is_empty() => AggregationRequest::DateHistogram {
                key,
                field: self.field_name.clone(),
                interval: interval.to_string(),
                timezone: self.locale.clone(),
            },
            _ => AggregationRequest::ValueCount {
                key,
                field: self.field_name.clone(),
            },
        }
    }

    /// Parse the `values` include filter; malformed input is logged and
    /// treated as "no filter".
    fn parse_values(&self) -> Vec<String> {
        let Some(raw) = self.values.as_deref().filter(|v| !v.is_empty()) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(values) => values,
            Err(err) => {
                warn!("ignoring unparseable terms include values '{}': {}", raw, err);
                Vec::new()
            }
        }
    }

    /// Parse the `{from,to}` pairs for a ranges aggregation; entries missing
    /// either bound are logged and skipped.
    fn parse_ranges(&self) -> Vec<(f64, f64)> {
        let Some(raw) = self.ranges.as_deref().filter(|v| !v.is_empty()) else {
            return Vec::new();
        };
        let entries: Vec<JsonValue> = match serde_json::from_str(raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("ignoring unparseable aggregation ranges '{}': {}", raw, err);
                return Vec::new();
            }
        };
        let mut bounds = Vec::new();
        for entry in entries {
            match (entry.get("from").and_then(JsonValue::as_f64), entry.get("to").and_then(JsonValue::as_f64)) {
                (Some(from), Some(to)) => bounds.push((from, to)),
                _ => warn!("skipping range bucket without numeric from/to: {}", entry),
            }
        }
        bounds
    }
}

/// Metric aggregations sharing the single-value request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Avg,
    Min,
    Max,
    Sum,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Avg => "avg",
            MetricKind::Min => "min",
            MetricKind::Max => "max",
            MetricKind::Sum => "sum",
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(MetricKind::Avg),
            "min" => Ok(MetricKind::Min),
            "max" => Ok(MetricKind::Max),
            "sum" => Ok(MetricKind::Sum),
            _ => Err(()),
        }
    }
}

/// A compiled aggregation request, rendered to the engine's native JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationRequest {
    DateHistogram {
        key: String,
        field: String,
        interval: String,
        timezone: Option<String>,
    },
    ValueCount {
        key: String,
        field: String,
    },
    Terms {
        key: String,
        field: String,
        include: Vec<String>,
        /// `None` means engine-default bucket count ("all buckets" on the
        /// engine versions the original targeted); a cap is configurable.
        cap: Option<u32>,
    },
    Metric {
        key: String,
        kind: MetricKind,
        field: String,
        format: Option<String>,
    },
    NumericRanges {
        key: String,
        field: String,
        ranges: Vec<(f64, f64)>,
        format: Option<String>,
    },
}

impl AggregationRequest {
    pub fn key(&self) -> &str {
        match self {
            AggregationRequest::DateHistogram { key, .. }
            | AggregationRequest::ValueCount { key, .. }
            | AggregationRequest::Terms { key, .. }
            | AggregationRequest::Metric { key, .. }
            | AggregationRequest::NumericRanges { key, .. } => key,
        }
    }

    /// Render the single-entry `aggs` body for this request.
    pub fn to_json(&self) -> JsonValue {
        match self {
            AggregationRequest::DateHistogram {
                key,
                field,
                interval,
                timezone,
            } => {
                let mut body = json!({
                    "field": field,
                    "calendar_interval": interval,
                });
                if let Some(tz) = timezone {
                    body["time_zone"] = json!(tz);
                }
                json!({ key: { "date_histogram": body } })
            }
            AggregationRequest::ValueCount { key, field } => {
                json!({ key: { "value_count": { "field": field } } })
            }
            AggregationRequest::Terms {
                key,
                field,
                include,
                cap,
            } => {
                let mut body = json!({ "field": field });
                if !include.is_empty() {
                    body["include"] = json!(include);
                }
                if let Some(cap) = cap {
                    body["size"] = json!(cap);
                }
                json!({ key: { "terms": body } })
            }
            AggregationRequest::Metric {
                key,
                kind,
                field,
                format,
            } => {
                let mut body = json!({ "field": field });
                if let Some(format) = format {
                    body["format"] = json!(format);
                }
                json!({ key: { kind.as_str(): body } })
            }
            AggregationRequest::NumericRanges {
                key,
                field,
                ranges,
                format,
            } => {
                let buckets: Vec<JsonValue> = ranges
                    .iter()
                    .map(|(from, to)| json!({ "from": from, "to": to }))
                    .collect();
                let mut body = json!({ "field": field, "ranges": buckets });
                if let Some(format) = format {
                    body["format"] = json!(format);
                }
                json!({ key: { "range": body } })
            }
        }
    }
}
