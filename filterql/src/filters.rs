use crate::errors::SearchError;
use crate::query::QueryNode;
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Fallback date format when a RangeFilter does not carry one.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// One field -> value mapping, the atomic filter unit inside a clause group.
///
/// The reserved key `"ranges"` holds a JSON-array-encoded string of
/// [`RangeFilter`] objects instead of a scalar value.
pub type Clause = IndexMap<String, String>;

/// The full declarative filter request: four independent, ordered clause
/// lists. An absent list deserializes as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub and: Vec<Clause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<Clause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not: Vec<Clause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Clause>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty() && self.not.is_empty() && self.filters.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Value kind of a range bound, driving how `from`/`to` are parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeKind {
    Number,
    Date,
    #[default]
    String,
}

/// One bounded comparison specification inside a `"ranges"` clause entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RangeFilter {
    #[serde(rename = "type")]
    pub kind: RangeKind,
    pub field_name: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub locale: Option<String>,
    pub format: Option<String>,
}

impl RangeFilter {
    /// Build the bounded comparison predicate for this range.
    ///
    /// `kind` selects bound parsing: numeric parse, format-aware date parse
    /// to epoch milliseconds, or raw string passthrough.
    pub fn to_predicate(&self) -> Result<QueryNode, SearchError> {
        if self.field_name.is_empty() {
            return Err(SearchError::ParseError(
                "range filter without fieldName".to_string(),
            ));
        }
        let (from, to) = match self.kind {
            RangeKind::Number => (
                self.parse_number_bound(self.from.as_deref())?,
                self.parse_number_bound(self.to.as_deref())?,
            ),
            RangeKind::Date => (
                self.parse_date_bound(self.from.as_deref())?,
                self.parse_date_bound(self.to.as_deref())?,
            ),
            RangeKind::String => (
                self.from.clone().map(JsonValue::String),
                self.to.clone().map(JsonValue::String),
            ),
        };
        if from.is_none() && to.is_none() {
            return Err(SearchError::ParseError(format!(
                "range filter on '{}' has no usable bounds",
                self.field_name
            )));
        }
        Ok(QueryNode::Range {
            field: self.field_name.clone(),
            from,
            to,
        })
    }

    fn parse_number_bound(&self, bound: Option<&str>) -> Result<Option<JsonValue>, SearchError> {
        match bound {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => {
                let num: f64 = raw.trim().parse().map_err(|_| {
                    SearchError::ParseError(format!(
                        "invalid numeric bound '{}' on '{}'",
                        raw, self.field_name
                    ))
                })?;
                Ok(Some(json!(num)))
            }
        }
    }

    fn parse_date_bound(&self, bound: Option<&str>) -> Result<Option<JsonValue>, SearchError> {
        match bound {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => {
                let format = self.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
                let millis = parse_date_millis(raw, format).ok_or_else(|| {
                    SearchError::ParseError(format!(
                        "invalid date bound '{}' for format '{}' on '{}'",
                        raw, format, self.field_name
                    ))
                })?;
                Ok(Some(json!(millis)))
            }
        }
    }
}

/// Parse a date or datetime string with the given chrono format into epoch
/// milliseconds (UTC midnight for date-only formats).
pub fn parse_date_millis(raw: &str, format: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, format)
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp_millis())
}
