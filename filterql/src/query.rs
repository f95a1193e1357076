use serde_json::{json, Value as JsonValue};

/// Boolean combination mode of a clause group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolGroup {
    Must,
    Should,
    MustNot,
    Filter,
}

/// One sub-query inside the composed boolean tree.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Single exact-match predicate on one field.
    Term { field: String, value: String },
    /// Multi-value exact-match predicate (comma-delimited input values).
    MultiTerm { field: String, values: Vec<String> },
    /// Pattern match with `*`/`?` wildcards.
    Wildcard { field: String, pattern: String },
    /// Bounded comparison; bounds are pre-parsed into native JSON scalars.
    Range {
        field: String,
        from: Option<JsonValue>,
        to: Option<JsonValue>,
    },
    /// Field presence check.
    Exists { field: String },
    /// Scoped query against a nested sub-document path, non-scoring.
    Nested { path: String, query: Box<QueryNode> },
    /// OR-weighted multi-word match used under should-semantics.
    FuzzyOrTerms { field: String, query: String },
    /// Free-text query string across a field group.
    FreeText { fields: Vec<String>, query: String },
    /// An inner boolean tree, used when nested branches combine.
    Bool(Box<ComposedQuery>),
}

/// A boolean tree over sub-queries, the compiler's output representation.
///
/// Rendered to the index's native JSON query DSL with [`ComposedQuery::to_json`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposedQuery {
    pub must: Vec<QueryNode>,
    pub should: Vec<QueryNode>,
    pub must_not: Vec<QueryNode>,
    pub filter: Vec<QueryNode>,
}

impl ComposedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, group: BoolGroup, node: QueryNode) {
        match group {
            BoolGroup::Must => self.must.push(node),
            BoolGroup::Should => self.should.push(node),
            BoolGroup::MustNot => self.must_not.push(node),
            BoolGroup::Filter => self.filter.push(node),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    /// Render the tree as the engine's native bool query JSON.
    pub fn to_json(&self) -> JsonValue {
        if self.is_empty() {
            return json!({ "match_all": {} });
        }
        let mut bool_body = serde_json::Map::new();
        for (name, nodes) in [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
            ("filter", &self.filter),
        ] {
            if !nodes.is_empty() {
                let rendered: Vec<JsonValue> = nodes.iter().map(QueryNode::to_json).collect();
                bool_body.insert(name.to_string(), JsonValue::Array(rendered));
            }
        }
        json!({ "bool": bool_body })
    }
}

impl QueryNode {
    pub fn to_json(&self) -> JsonValue {
        match self {
            QueryNode::Term { field, value } => json!({ "match": { field: value } }),
            QueryNode::MultiTerm { field, values } => json!({ "terms": { field: values } }),
            QueryNode::Wildcard { field, pattern } => json!({ "wildcard": { field: pattern } }),
            QueryNode::Range { field, from, to } => {
                let mut bounds = serde_json::Map::new();
                if let Some(from) = from {
                    bounds.insert("gte".to_string(), from.clone());
                }
                if let Some(to) = to {
                    bounds.insert("lte".to_string(), to.clone());
                }
                json!({ "range": { field: bounds } })
            }
            QueryNode::Exists { field } => json!({ "exists": { "field": field } }),
            QueryNode::Nested { path, query } => json!({
                "nested": {
                    "path": path,
                    "score_mode": "none",
                    "query": query.to_json(),
                }
            }),
            QueryNode::FuzzyOrTerms { field, query } => json!({
                "match": {
                    field: {
                        "query": query,
                        "operator": "or",
                        "fuzziness": "AUTO",
                    }
                }
            }),
            QueryNode::FreeText { fields, query } => json!({
                "query_string": {
                    "query": query,
                    "fields": fields,
                    "analyze_wildcard": true,
                }
            }),
            QueryNode::Bool(inner) => inner.to_json(),
        }
    }
}
