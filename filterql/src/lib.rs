//! Declarative filter/aggregation language over an external document search
//! index.
//!
//! A caller supplies a [`FilterSpec`] (four independent clause lists:
//! `and`/`or`/`not`/`filters`), an optional [`AggregationSpec`], and paging
//! parameters. The compiler builds a [`ComposedQuery`] boolean tree in the
//! index's native JSON representation, the [`Retriever`] executes it against
//! a [`SearchIndex`] collaborator (switching to scroll mode for deep pages),
//! and the normalizer flattens whatever aggregation shape comes back into an
//! ordered label -> value map.

pub mod aggregation;
pub mod compile;
pub mod config;
pub mod errors;
pub mod filters;
pub mod nested;
pub mod normalize;
pub mod query;
pub mod registry;
pub mod scroll;

pub use aggregation::{AggregationRequest, AggregationSpec, MetricKind};
pub use compile::{compile, compile_text, NESTED_MARKER, RANGES_KEY};
pub use config::RetrievalConfig;
pub use errors::SearchError;
pub use filters::{Clause, FilterSpec, RangeFilter, RangeKind};
pub use nested::{resolve, NestingTree, Resolved, MAX_PATH_SEGMENTS};
pub use normalize::{normalize, AggregationResult};
pub use query::{BoolGroup, ComposedQuery, QueryNode};
pub use registry::{fields_from_mappings, SchemaDescriptor, SchemaRegistry};
pub use scroll::{
    PageRequest, Retriever, ScrollCursor, SearchIndex, SearchResponse, PAGE_SIZE_ALL,
};
