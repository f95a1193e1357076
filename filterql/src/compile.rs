use crate::errors::SearchError;
use crate::filters::{Clause, FilterSpec, RangeFilter};
use crate::nested::{self, Resolved};
use crate::query::{BoolGroup, ComposedQuery, QueryNode};
use log::{debug, warn};

/// Field-name prefix marking a nested-document query.
pub const NESTED_MARKER: &str = "_Nst";

/// Reserved clause key carrying a JSON array of range filters.
pub const RANGES_KEY: &str = "ranges";

/// Compile a filter spec into one composed boolean query.
///
/// The four clause lists are processed independently: `and` under
/// must-semantics, `or` under should, `not` under must_not, `filters` under
/// the non-scoring filter group. Malformed range entries are logged and
/// skipped, never aborting an otherwise valid compile.
pub fn compile(spec: &FilterSpec) -> ComposedQuery {
    let mut query = ComposedQuery::new();
    compile_clauses(&spec.and, BoolGroup::Must, &mut query);
    compile_clauses(&spec.or, BoolGroup::Should, &mut query);
    compile_clauses(&spec.not, BoolGroup::MustNot, &mut query);
    compile_clauses(&spec.filters, BoolGroup::Filter, &mut query);
    debug!("compiled filter spec into {:?}", query);
    query
}

/// Compile a free-text search over a field list. Dotted field names route
/// through the nested path resolver; otherwise one flat free-text query
/// covers all fields, combined under should-semantics.
pub fn compile_text(query_text: &str, fields: &[String]) -> Result<ComposedQuery, SearchError> {
    match nested::resolve(fields)? {
        Resolved::Flat(fields) => {
            let mut composed = ComposedQuery::new();
            composed.push(
                BoolGroup::Should,
                QueryNode::FreeText {
                    fields,
                    query: query_text.to_string(),
                },
            );
            Ok(composed)
        }
        Resolved::Tree(tree) => Ok(tree.to_query(query_text)),
    }
}

fn compile_clauses(clauses: &[Clause], group: BoolGroup, query: &mut ComposedQuery) {
    for clause in clauses {
        for (key, value) in clause {
            if key == RANGES_KEY {
                compile_ranges(value, query);
            } else if value.is_empty() {
                query.push(
                    group,
                    QueryNode::Exists {
                        field: key.clone(),
                    },
                );
            } else if let Some(node) = key_value_node(key, value, group) {
                query.push(group, node);
            }
        }
    }
}

/// Parse the reserved ranges value as a JSON array of [`RangeFilter`] and
/// attach each bounded predicate. Range predicates do not inherit the
/// enclosing clause group; they land in the non-scoring filter group.
/// A malformed entry is logged and skipped, the batch continues.
fn compile_ranges(value: &str, query: &mut ComposedQuery) {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(value) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("skipping unparseable ranges value '{}': {}", value, err);
            return;
        }
    };
    for entry in entries {
        let range: RangeFilter = match serde_json::from_value(entry.clone()) {
            Ok(range) => range,
            Err(err) => {
                warn!("skipping malformed range entry {}: {}", entry, err);
                continue;
            }
        };
        match range.to_predicate() {
            Ok(node) => query.push(BoolGroup::Filter, node),
            Err(err) => warn!("skipping range entry on '{}': {}", range.field_name, err),
        }
    }
}

/// Build the sub-query for one non-empty key/value pair, or `None` when the
/// pair cannot produce a query (e.g. a nested marker without a path).
fn key_value_node(key: &str, value: &str, group: BoolGroup) -> Option<QueryNode> {
    if let Some(stripped) = key.strip_prefix(NESTED_MARKER) {
        if stripped.contains('.') {
            return nested_term_node(stripped, value, group);
        }
    }
    if value.contains('*') || value.contains('?') {
        return Some(QueryNode::Wildcard {
            field: key.to_string(),
            pattern: value.to_string(),
        });
    }
    Some(term_node(key, value, group))
}

/// Scoped term query beneath the path before the last separator, non-scoring.
fn nested_term_node(field: &str, value: &str, group: BoolGroup) -> Option<QueryNode> {
    let path = match field.rfind('.') {
        Some(idx) => &field[..idx],
        None => {
            warn!("nested field '{}' has no path separator, skipping", field);
            return None;
        }
    };
    Some(QueryNode::Nested {
        path: path.to_string(),
        query: Box::new(term_node(field, value, group)),
    })
}

/// Term predicate selection: should-semantics gets an OR-weighted fuzzy
/// match over the whole value; elsewhere a comma-delimited value is treated
/// as an implicit list (this convention is intentional, not JSON), and a
/// plain value becomes a single exact match.
fn term_node(field: &str, value: &str, group: BoolGroup) -> QueryNode {
    if group == BoolGroup::Should {
        return QueryNode::FuzzyOrTerms {
            field: field.to_string(),
            query: value.to_string(),
        };
    }
    if value.contains(',') {
        QueryNode::MultiTerm {
            field: field.to_string(),
            values: value.split(',').map(|v| v.trim().to_string()).collect(),
        }
    } else {
        QueryNode::Term {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}
