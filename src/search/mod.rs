//! Ranked keyword search over the Vidal and Meddispar index.
//!
//! Stateless: every call is one request with no memory of the previous ones.
//! Results keep the backend's relevance order.

use std::sync::Arc;

use crate::client::config::DEFAULT_SEARCH_LIMIT;
use crate::client::{
    ApiResult, PharmaApi, SearchParams, SearchResponse, SearchResult, SourceType, TransportError,
};

/// A search request as typed by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    /// The search text.
    pub text: String,
    /// Optional `source_type` filter.
    pub source_filter: Option<String>,
    /// Maximum number of results, `None` for the executor default.
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Create a new query over all sources.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_filter: None,
            limit: None,
        }
    }

    /// Restrict results to one citable knowledge base.
    #[must_use]
    pub fn with_source_type(self, source_type: SourceType) -> Self {
        self.with_source_filter(source_type.as_str())
    }

    /// Restrict results to any index category.
    #[must_use]
    pub fn with_source_filter(mut self, source_type: impl Into<String>) -> Self {
        self.source_filter = Some(source_type.into());
        self
    }

    /// Set max results. Zero keeps the executor default.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }
}

/// How a search outcome should be presented.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchView {
    /// Nothing was searched (blank query).
    Idle,
    /// At least one hit.
    Results,
    /// The backend answered with no hit.
    NoResults,
    /// The backend could not be queried.
    Unavailable,
}

/// Result of one search call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOutcome {
    /// Query the outcome belongs to.
    pub query: String,
    /// Hits in backend order.
    pub results: Vec<SearchResult>,
    /// Hit count reported by the backend.
    pub total_results: usize,
    /// Failure description, when the backend could not be queried.
    pub error: Option<String>,
    searched: bool,
}

impl SearchOutcome {
    /// Outcome of a search the backend answered.
    #[must_use]
    pub fn from_response(query: &str, response: SearchResponse) -> Self {
        Self {
            query: query.to_string(),
            results: response.results,
            total_results: response.total_results,
            error: None,
            searched: true,
        }
    }

    /// Outcome of a search the backend could not answer.
    #[must_use]
    pub fn failed(query: &str, error: &TransportError) -> Self {
        Self {
            query: query.to_string(),
            error: Some(error.to_string()),
            searched: true,
            ..Self::default()
        }
    }

    /// Presentation state of this outcome.
    #[must_use]
    pub fn view(&self) -> SearchView {
        if !self.searched {
            SearchView::Idle
        } else if self.error.is_some() {
            SearchView::Unavailable
        } else if self.results.is_empty() {
            SearchView::NoResults
        } else {
            SearchView::Results
        }
    }
}

/// Runs searches against the backend.
#[derive(Clone)]
pub struct SearchExecutor {
    api: Arc<dyn PharmaApi>,
    default_limit: usize,
}

impl SearchExecutor {
    /// Executor falling back to a limit of 10.
    #[must_use]
    pub fn new(api: Arc<dyn PharmaApi>) -> Self {
        Self::with_default_limit(api, DEFAULT_SEARCH_LIMIT)
    }

    /// Executor with a custom fallback limit.
    #[must_use]
    pub fn with_default_limit(api: Arc<dyn PharmaApi>, default_limit: usize) -> Self {
        Self {
            api,
            default_limit: default_limit.max(1),
        }
    }

    /// Wire parameters for a query.
    #[must_use]
    pub fn params(&self, query: &SearchQuery) -> SearchParams {
        SearchParams {
            q: query.text.clone(),
            source_type: query.source_filter.clone(),
            limit: query.limit.unwrap_or(self.default_limit),
        }
    }

    /// Run a search, surfacing transport errors.
    ///
    /// Hits outside the requested `source_type` are dropped; when any are,
    /// `total_results` becomes the number of hits kept.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be queried.
    pub async fn try_search(&self, query: &SearchQuery) -> ApiResult<SearchResponse> {
        let mut response = self.api.search(self.params(query)).await?;

        if let Some(filter) = &query.source_filter {
            let before = response.results.len();
            response.results.retain(|r| r.source_type == *filter);
            let dropped = before - response.results.len();
            if dropped > 0 {
                tracing::warn!("Backend returned {dropped} results outside source_type={filter}");
                response.total_results = response.results.len();
            }
        }

        Ok(response)
    }

    /// Run a search, absorbing failures into an empty outcome.
    ///
    /// A blank query is not sent and yields an idle outcome.
    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        if query.text.trim().is_empty() {
            return SearchOutcome::default();
        }

        match self.try_search(query).await {
            Ok(response) => SearchOutcome::from_response(&query.text, response),
            Err(e) => {
                tracing::warn!("Search failed for {:?}: {e}", query.text);
                SearchOutcome::failed(&query.text, &e)
            }
        }
    }
}
