/// Error types for filter compilation and query execution
#[derive(Debug)]
pub enum SearchError {
    /// Malformed FilterSpec/AggregationSpec/RangeFilter input.
    ParseError(String),
    /// Fatal compile failure, e.g. nesting depth exceeded.
    CompileError(String),
    /// The external index rejected or failed a round trip.
    ExecutionError(String),
    SerdeJsonError(serde_json::Error),
    SchemaNotFound(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::SerdeJsonError(err)
    }
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SearchError::CompileError(msg) => write!(f, "Compile error: {}", msg),
            SearchError::ExecutionError(msg) => write!(f, "Execution error: {}", msg),
            SearchError::SerdeJsonError(err) => write!(f, "Serde JSON error: {}", err),
            SearchError::SchemaNotFound(name) => write!(f, "Schema not found: {}", name),
        }
    }
}

impl std::error::Error for SearchError {}
