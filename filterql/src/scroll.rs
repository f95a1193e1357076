use crate::aggregation::{AggregationRequest, AggregationSpec};
use crate::compile;
use crate::config::RetrievalConfig;
use crate::errors::SearchError;
use crate::filters::FilterSpec;
use crate::normalize::{self, AggregationResult};
use crate::query::ComposedQuery;
use crate::registry::SchemaDescriptor;
use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Default page number (0-based) and size when a caller passes neither.
const DEFAULT_PAGE: usize = 0;
const DEFAULT_PAGE_SIZE: usize = 10;

/// Sentinel page size meaning "retrieve everything".
pub const PAGE_SIZE_ALL: i64 = -1;

/// A bounded page request, 0-based, handed to the index as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    /// Build from 1-based caller paging parameters; `None` when the caller
    /// requested no paging at all.
    pub fn from_params(page_no: i64, page_size: i64) -> Option<Self> {
        if page_no <= 0 && page_size <= 0 {
            return None;
        }
        let page = if page_no > 0 { (page_no - 1) as usize } else { DEFAULT_PAGE };
        let size = if page_size > 1 { page_size as usize } else { DEFAULT_PAGE_SIZE };
        Some(Self { page, size })
    }
}

/// One page of documents plus the opaque aggregation container, exactly as
/// the engine returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub documents: Vec<JsonValue>,
    pub aggregations: Option<JsonValue>,
}

/// Opaque scroll cursor handle issued by the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollCursor(pub String);

/// The external document index. Storage, scoring and execution live behind
/// this boundary; the coordinator only issues round trips.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn execute(
        &self,
        query: &ComposedQuery,
        schema: &SchemaDescriptor,
        page: Option<PageRequest>,
        aggregation: Option<&AggregationRequest>,
    ) -> Result<SearchResponse, SearchError>;

    async fn count(
        &self,
        query: &ComposedQuery,
        schema: &SchemaDescriptor,
    ) -> Result<u64, SearchError>;

    async fn open_scroll(
        &self,
        query: &ComposedQuery,
        schema: &SchemaDescriptor,
        keep_alive: Duration,
    ) -> Result<ScrollCursor, SearchError>;

    /// Fetch the next batch; an empty batch terminates the scroll.
    async fn continue_scroll(
        &self,
        cursor: &ScrollCursor,
        keep_alive: Duration,
    ) -> Result<Vec<JsonValue>, SearchError>;
}

/// Deep-pagination coordinator: compiles specs and decides per request
/// between one bounded paged query and a full-scroll buffered retrieval.
pub struct Retriever<I> {
    index: I,
    config: RetrievalConfig,
}

impl<I: SearchIndex> Retriever<I> {
    pub fn new(index: I, config: RetrievalConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Scroll mode applies when the requested window exceeds the configured
    /// maximum single-request window, or on the explicit retrieve-everything
    /// sentinel.
    pub fn is_scroll(&self, page_no: i64, page_size: i64) -> bool {
        if page_no > 0 || page_size > 0 {
            let page = if page_no < 1 { 1 } else { page_no };
            if page.saturating_mul(page_size.max(0)) as u64 > self.config.max_result_window {
                return true;
            }
        }
        page_size == PAGE_SIZE_ALL
    }

    /// Compile then retrieve the documents matching a filter spec.
    pub async fn search(
        &self,
        spec: &FilterSpec,
        schema: &SchemaDescriptor,
        page_no: i64,
        page_size: i64,
    ) -> Result<Vec<JsonValue>, SearchError> {
        let query = compile::compile(spec);
        self.retrieve(&query, schema, page_no, page_size).await
    }

    /// Free-text search over a field list (nested-aware).
    pub async fn search_text(
        &self,
        text: &str,
        fields: &[String],
        schema: &SchemaDescriptor,
        page_no: i64,
        page_size: i64,
    ) -> Result<Vec<JsonValue>, SearchError> {
        let query = compile::compile_text(text, fields)?;
        self.retrieve(&query, schema, page_no, page_size).await
    }

    /// Count the documents matching a filter spec without fetching them.
    pub async fn count(
        &self,
        spec: &FilterSpec,
        schema: &SchemaDescriptor,
    ) -> Result<u64, SearchError> {
        let query = compile::compile(spec);
        self.index.count(&query, schema).await
    }

    /// Run a filtered aggregation and flatten the response buckets.
    /// `Ok(None)` means no aggregation was compiled or none came back.
    pub async fn aggregate(
        &self,
        spec: &FilterSpec,
        aggregation: &AggregationSpec,
        schema: &SchemaDescriptor,
    ) -> Result<Option<AggregationResult>, SearchError> {
        let query = compile::compile(spec);
        let Some(request) = aggregation.compile(self.config.terms_bucket_cap) else {
            return Ok(None);
        };
        let response = self
            .index
            .execute(&query, schema, None, Some(&request))
            .await?;
        let Some(container) = response.aggregations else {
            debug!("response carried no aggregations for key '{}'", request.key());
            return Ok(None);
        };
        Ok(normalize::normalize(&container, aggregation))
    }

    /// Execute a composed query, choosing bounded paging or scroll mode.
    pub async fn retrieve(
        &self,
        query: &ComposedQuery,
        schema: &SchemaDescriptor,
        page_no: i64,
        page_size: i64,
    ) -> Result<Vec<JsonValue>, SearchError> {
        if self.is_scroll(page_no, page_size) {
            self.scroll_retrieve(query, schema, page_no, page_size).await
        } else {
            let page = PageRequest::from_params(page_no, page_size);
            let response = self.index.execute(query, schema, page, None).await?;
            Ok(response.documents)
        }
    }

    /// Buffer the entire matching set over a scroll cursor, then slice.
    ///
    /// This deliberately holds the full result set in memory before slicing;
    /// the window threshold in the config is the only practical bound.
    async fn scroll_retrieve(
        &self,
        query: &ComposedQuery,
        schema: &SchemaDescriptor,
        page_no: i64,
        page_size: i64,
    ) -> Result<Vec<JsonValue>, SearchError> {
        let keep_alive = self.config.scroll_keep_alive;
        let cursor = self.index.open_scroll(query, schema, keep_alive).await?;
        let mut buffer = Vec::new();
        loop {
            let batch = self.index.continue_scroll(&cursor, keep_alive).await?;
            if batch.is_empty() {
                break;
            }
            buffer.extend(batch);
        }
        info!(
            "scroll over '{}' buffered {} documents",
            schema.index,
            buffer.len()
        );
        Ok(slice_page(buffer, page_no, page_size))
    }
}

/// Half-open page window `[(page_no-1)*size, page_no*size)` over the
/// buffer, clipped to its bounds; a non-positive page returns everything.
fn slice_page(buffer: Vec<JsonValue>, page_no: i64, page_size: i64) -> Vec<JsonValue> {
    if page_no <= 0 || page_size <= 0 {
        return buffer;
    }
    let size = page_size as usize;
    let from = (page_no as usize - 1).saturating_mul(size).min(buffer.len());
    let to = (page_no as usize).saturating_mul(size).min(buffer.len());
    buffer[from..to].to_vec()
}
