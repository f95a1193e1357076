use crate::errors::SearchError;
use crate::query::{BoolGroup, ComposedQuery, QueryNode};
use indexmap::IndexMap;

/// Maximum dotted-path depth: three nesting levels plus the leaf segment.
pub const MAX_PATH_SEGMENTS: usize = 4;

/// A persistent nesting tree merged from dotted field paths.
///
/// Children are keyed by the cumulative dotted prefix (the nested scope
/// path), so `a.b.c` and `a.b.d` collapse onto one `a` -> `a.b` branch with
/// the leaf set `{a.b.c, a.b.d}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestingTree {
    children: IndexMap<String, NestingTree>,
    leaves: Vec<String>,
}

/// Outcome of resolving a field list: either no path separators were seen
/// and the caller should run one flat free-text query, or a merged tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Flat(Vec<String>),
    Tree(NestingTree),
}

impl NestingTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.leaves.is_empty()
    }

    /// Nested scope paths directly below this node, in insertion order.
    pub fn child_paths(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }

    pub fn child(&self, path: &str) -> Option<&NestingTree> {
        self.children.get(path)
    }

    /// Full field names terminating directly under this node.
    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    /// Build the single-field chain for one dotted field name.
    fn chain(field: &str) -> Result<NestingTree, SearchError> {
        let segments: Vec<&str> = field.split('.').collect();
        if segments.len() > MAX_PATH_SEGMENTS {
            return Err(SearchError::CompileError(format!(
                "field '{}' exceeds the supported nesting depth of {} segments",
                field, MAX_PATH_SEGMENTS
            )));
        }
        let mut node = NestingTree {
            children: IndexMap::new(),
            leaves: vec![field.to_string()],
        };
        // Wrap the leaf in scope nodes, innermost prefix first.
        for depth in (1..segments.len()).rev() {
            let path = segments[..depth].join(".");
            let mut parent = NestingTree::new();
            parent.children.insert(path, node);
            node = parent;
        }
        Ok(node)
    }

    /// Pure structural union of two trees; shared prefixes collapse onto one
    /// branch rather than producing siblings.
    fn union(mut self, other: NestingTree) -> NestingTree {
        for leaf in other.leaves {
            if !self.leaves.contains(&leaf) {
                self.leaves.push(leaf);
            }
        }
        for (path, subtree) in other.children {
            match self.children.shift_remove(&path) {
                Some(existing) => {
                    self.children.insert(path, existing.union(subtree));
                }
                None => {
                    self.children.insert(path, subtree);
                }
            }
        }
        self
    }

    /// Walk the tree leaf-outward and emit nested free-text wrappers for the
    /// given query text. Top-level branches combine under should-semantics.
    pub fn to_query(&self, query: &str) -> ComposedQuery {
        let mut composed = ComposedQuery::new();
        for node in self.branch_queries(query) {
            composed.push(BoolGroup::Should, node);
        }
        composed
    }

    fn branch_queries(&self, query: &str) -> Vec<QueryNode> {
        let mut nodes = Vec::new();
        if !self.leaves.is_empty() {
            // A leaf group shares one free-text query scored in its scope; a
            // single leaf is simply the one-field case of the same query.
            nodes.push(QueryNode::FreeText {
                fields: self.leaves.clone(),
                query: query.to_string(),
            });
        }
        for (path, subtree) in &self.children {
            nodes.push(QueryNode::Nested {
                path: path.clone(),
                query: Box::new(subtree.scoped_query(query)),
            });
        }
        nodes
    }

    fn scoped_query(&self, query: &str) -> QueryNode {
        let mut nodes = self.branch_queries(query);
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            let mut inner = ComposedQuery::new();
            for node in nodes {
                inner.push(BoolGroup::Should, node);
            }
            QueryNode::Bool(Box::new(inner))
        }
    }
}

/// Merge an ordered sequence of field names into a shared nesting tree, or
/// report that a flat query suffices because no name is dotted.
pub fn resolve(fields: &[String]) -> Result<Resolved, SearchError> {
    if !fields.iter().any(|f| f.contains('.')) {
        return Ok(Resolved::Flat(fields.to_vec()));
    }
    let mut tree = NestingTree::new();
    for field in fields {
        tree = tree.union(NestingTree::chain(field)?);
    }
    Ok(Resolved::Tree(tree))
}
