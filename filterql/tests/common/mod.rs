//! Common test utilities: an in-memory stand-in for the external document
//! index, plus shared sample documents.

#![allow(dead_code)]

use async_trait::async_trait;
use filterql::{
    AggregationRequest, ComposedQuery, MetricKind, PageRequest, QueryNode, SchemaDescriptor,
    ScrollCursor, SearchError, SearchIndex, SearchResponse,
};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory fake of the external index. Evaluates composed queries against
/// a document list, supports terms/metric/value-count aggregations and
/// chunked scrolling, and counts round trips for assertions.
pub struct MemoryIndex {
    documents: Vec<JsonValue>,
    scroll_batch: usize,
    cursors: Mutex<HashMap<String, Vec<Vec<JsonValue>>>>,
    next_cursor: AtomicUsize,
    pub execute_calls: AtomicUsize,
    pub scroll_opens: AtomicUsize,
}

impl MemoryIndex {
    pub fn new(documents: Vec<JsonValue>) -> Self {
        Self {
            documents,
            scroll_batch: 2,
            cursors: Mutex::new(HashMap::new()),
            next_cursor: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
            scroll_opens: AtomicUsize::new(0),
        }
    }

    pub fn with_scroll_batch(mut self, batch: usize) -> Self {
        self.scroll_batch = batch;
        self
    }

    fn matching(&self, query: &ComposedQuery) -> Vec<JsonValue> {
        self.documents
            .iter()
            .filter(|doc| query_matches(query, doc))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn execute(
        &self,
        query: &ComposedQuery,
        _schema: &SchemaDescriptor,
        page: Option<PageRequest>,
        aggregation: Option<&AggregationRequest>,
    ) -> Result<SearchResponse, SearchError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        let matching = self.matching(query);
        let aggregations = aggregation.map(|request| aggregate(&matching, request));
        let documents = match page {
            Some(PageRequest { page, size }) => matching
                .into_iter()
                .skip(page * size)
                .take(size)
                .collect(),
            None => matching,
        };
        Ok(SearchResponse {
            documents,
            aggregations,
        })
    }

    async fn count(
        &self,
        query: &ComposedQuery,
        _schema: &SchemaDescriptor,
    ) -> Result<u64, SearchError> {
        Ok(self.matching(query).len() as u64)
    }

    async fn open_scroll(
        &self,
        query: &ComposedQuery,
        _schema: &SchemaDescriptor,
        _keep_alive: Duration,
    ) -> Result<ScrollCursor, SearchError> {
        self.scroll_opens.fetch_add(1, Ordering::SeqCst);
        let id = format!("cursor-{}", self.next_cursor.fetch_add(1, Ordering::SeqCst));
        let batches: Vec<Vec<JsonValue>> = self
            .matching(query)
            .chunks(self.scroll_batch)
            .map(<[JsonValue]>::to_vec)
            .collect();
        self.cursors.lock().unwrap().insert(id.clone(), batches);
        Ok(ScrollCursor(id))
    }

    async fn continue_scroll(
        &self,
        cursor: &ScrollCursor,
        _keep_alive: Duration,
    ) -> Result<Vec<JsonValue>, SearchError> {
        let mut cursors = self.cursors.lock().unwrap();
        let batches = cursors
            .get_mut(&cursor.0)
            .ok_or_else(|| SearchError::ExecutionError(format!("unknown scroll cursor {}", cursor.0)))?;
        if batches.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(batches.remove(0))
        }
    }
}

/// Evaluate a composed query against one document, approximating the
/// engine's bool semantics closely enough for the compiler contracts.
pub fn query_matches(query: &ComposedQuery, doc: &JsonValue) -> bool {
    let conjunctive = query.must.iter().all(|n| node_matches(n, doc))
        && query.filter.iter().all(|n| node_matches(n, doc))
        && !query.must_not.iter().any(|n| node_matches(n, doc));
    if !query.should.is_empty() && query.must.is_empty() && query.filter.is_empty() {
        conjunctive && query.should.iter().any(|n| node_matches(n, doc))
    } else {
        conjunctive
    }
}

fn node_matches(node: &QueryNode, doc: &JsonValue) -> bool {
    match node {
        QueryNode::Term { field, value } => {
            field_strings(doc, field).iter().any(|v| v == value)
        }
        QueryNode::MultiTerm { field, values } => field_strings(doc, field)
            .iter()
            .any(|v| values.contains(v)),
        QueryNode::Wildcard { field, pattern } => field_strings(doc, field)
            .iter()
            .any(|v| glob_matches(pattern, v)),
        QueryNode::Range { field, from, to } => field_numbers(doc, field).iter().any(|v| {
            from.as_ref().and_then(JsonValue::as_f64).map_or(true, |f| *v >= f)
                && to.as_ref().and_then(JsonValue::as_f64).map_or(true, |t| *v <= t)
        }),
        QueryNode::Exists { field } => !field_values(doc, field).is_empty(),
        QueryNode::Nested { query, .. } => node_matches(query, doc),
        QueryNode::FuzzyOrTerms { field, query } => {
            let haystacks = field_strings(doc, field);
            query.split_whitespace().any(|word| {
                haystacks
                    .iter()
                    .any(|h| h.to_lowercase().contains(&word.to_lowercase()))
            })
        }
        QueryNode::FreeText { fields, query } => fields.iter().any(|field| {
            field_strings(doc, field)
                .iter()
                .any(|v| v.to_lowercase().contains(&query.to_lowercase()))
        }),
        QueryNode::Bool(inner) => query_matches(inner, doc),
    }
}

/// Resolve a dotted field path, descending through arrays.
fn field_values<'a>(doc: &'a JsonValue, path: &str) -> Vec<&'a JsonValue> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            let candidates: Vec<&JsonValue> = match value {
                JsonValue::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for candidate in candidates {
                if let Some(found) = candidate.get(segment) {
                    next.push(found);
                }
            }
        }
        current = next;
    }
    current
        .into_iter()
        .flat_map(|v| match v {
            JsonValue::Array(items) => items.iter().collect(),
            other => vec![other],
        })
        .filter(|v| !v.is_null())
        .collect()
}

fn field_strings(doc: &JsonValue, path: &str) -> Vec<String> {
    field_values(doc, path)
        .into_iter()
        .map(|v| match v {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

fn field_numbers(doc: &JsonValue, path: &str) -> Vec<f64> {
    field_values(doc, path)
        .into_iter()
        .filter_map(|v| match v {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.parse().ok(),
            _ => None,
        })
        .collect()
}

/// Minimal `*`/`?` glob matcher for wildcard predicates.
fn glob_matches(pattern: &str, value: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();
    fn inner(p: &[char], v: &[char]) -> bool {
        match (p.first(), v.first()) {
            (None, None) => true,
            (Some('*'), _) => inner(&p[1..], v) || (!v.is_empty() && inner(p, &v[1..])),
            (Some('?'), Some(_)) => inner(&p[1..], &v[1..]),
            (Some(pc), Some(vc)) if pc == vc => inner(&p[1..], &v[1..]),
            _ => false,
        }
    }
    inner(&p, &v)
}

/// Compute the raw aggregation container the way the engine would shape it.
fn aggregate(documents: &[JsonValue], request: &AggregationRequest) -> JsonValue {
    match request {
        AggregationRequest::Terms { key, field, include, .. } => {
            let mut counts: Vec<(String, u64)> = Vec::new();
            for doc in documents {
                for value in field_strings(doc, field) {
                    if !include.is_empty() && !include.contains(&value) {
                        continue;
                    }
                    match counts.iter_mut().find(|(label, _)| *label == value) {
                        Some((_, count)) => *count += 1,
                        None => counts.push((value, 1)),
                    }
                }
            }
            let buckets: Vec<JsonValue> = counts
                .into_iter()
                .map(|(label, count)| json!({ "key": label, "doc_count": count }))
                .collect();
            json!({ key: { "buckets": buckets } })
        }
        AggregationRequest::Metric { key, kind, field, .. } => {
            let values: Vec<f64> = documents
                .iter()
                .flat_map(|doc| field_numbers(doc, field))
                .collect();
            let value = match kind {
                MetricKind::Sum => values.iter().sum::<f64>(),
                MetricKind::Avg => {
                    if values.is_empty() {
                        0.0
                    } else {
                        values.iter().sum::<f64>() / values.len() as f64
                    }
                }
                MetricKind::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
                MetricKind::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            };
            json!({ key: { "value": value, "value_as_string": value.to_string() } })
        }
        AggregationRequest::ValueCount { key, field } => {
            let count: usize = documents
                .iter()
                .map(|doc| field_values(doc, field).len())
                .sum();
            json!({ key: { "value": count } })
        }
        AggregationRequest::DateHistogram { key, .. }
        | AggregationRequest::NumericRanges { key, .. } => {
            // Shapes exercised through the normalizer's own fixtures.
            json!({ key: { "buckets": [] } })
        }
    }
}

/// Documents shared across the integration tests.
pub fn sample_documents() -> Vec<JsonValue> {
    vec![
        json!({ "id": 1, "status": "active", "category": "A", "price": 10.0,
                "name": "alpha server", "address": { "city": "rotterdam" } }),
        json!({ "id": 2, "status": "active", "category": "A", "price": 20.0,
                "name": "beta server", "address": { "city": "delft" } }),
        json!({ "id": 3, "status": "active", "category": "A", "price": 30.0,
                "name": "gamma box", "address": { "city": "rotterdam" } }),
        json!({ "id": 4, "status": "inactive", "category": "B", "price": 40.0,
                "name": "delta box", "address": { "city": "utrecht" } }),
        json!({ "id": 5, "status": "inactive", "category": "B", "price": 50.0,
                "name": "epsilon rig", "address": { "city": "utrecht" } }),
        json!({ "id": 6, "status": "inactive", "category": "B", "price": 60.0,
                "name": "zeta rig", "address": { "city": "leiden" } }),
        json!({ "id": 7, "status": "archived", "category": "B", "price": 70.0,
                "name": "eta rig", "address": { "city": "leiden" } }),
        json!({ "id": 8, "status": "archived", "category": "B", "price": 80.0,
                "name": "theta node" }),
    ]
}

pub fn test_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "Server",
        "servers",
        vec![
            "name".to_string(),
            "status".to_string(),
            "category".to_string(),
        ],
    )
}
