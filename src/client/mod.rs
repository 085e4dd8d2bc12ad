//! HTTP transport for the `PharmaBot` backend.
//!
//! This module provides the thin request layer every other component uses:
//! - A single `reqwest` client bound to one configured base address
//! - JSON request/response bodies with typed decoding
//! - A `PharmaApi` trait seam for the chat orchestrator and search executor
//! - Diagnostics endpoints (`/health`, `/status`, `/search/stats`)
//!
//! One best-effort attempt per call: no retries, no caching.

pub mod config;
pub mod error;
pub mod types;

pub use config::ClientConfig;
pub use error::{ApiResult, TransportError};
pub use types::{
    ChatRequest, ChatResponse, Message, Role, SearchParams, SearchResponse, SearchResult,
    SearchStats, Source, SourceType,
};

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::chat::session::SessionId;
use types::ClearSessionRequest;

/// Boxed future type for backend operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backend operations the orchestration layer depends on.
pub trait PharmaApi: Send + Sync {
    /// Send one chat turn with its prior context.
    ///
    /// # Errors
    /// Returns an error if the request fails or the answer is malformed.
    fn chat(&self, request: ChatRequest) -> ApiFuture<'_, ApiResult<ChatResponse>>;
    /// Ask the backend to release a session.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn clear_session(&self, session_id: SessionId) -> ApiFuture<'_, ApiResult<()>>;
    /// Run a ranked keyword search.
    ///
    /// # Errors
    /// Returns an error if the request fails or the answer is malformed.
    fn search(&self, params: SearchParams) -> ApiFuture<'_, ApiResult<SearchResponse>>;
}

/// JSON client for the `PharmaBot` REST API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    config: ClientConfig,
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client from a validated configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;
        let client = Self::build_client(&config)?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Create a client from the environment (`PHARMABOT_API_URL`, ...).
    ///
    /// # Errors
    /// Returns an error if the resulting configuration is invalid.
    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Build an HTTP client with JSON content negotiation.
    fn build_client(config: &ClientConfig) -> ApiResult<reqwest::Client> {
        use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let ua = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| TransportError::InvalidConfig(format!("user_agent: {e}")))?;
        headers.insert(USER_AGENT, ua);

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| TransportError::HttpClient(e.to_string()))
    }

    /// Configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET` a path and decode the JSON body.
    ///
    /// # Errors
    /// Returns an error on connection failure, timeout, non-2xx status or malformed JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path);
        tracing::debug!("GET {url}");

        let (status, body) = Self::execute(self.client.get(&url)).await?;
        decode(status, &body)
    }

    /// `GET` a path with serialized query parameters and decode the JSON body.
    ///
    /// # Errors
    /// Returns an error on connection failure, timeout, non-2xx status or malformed JSON.
    pub async fn get_json_with<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + Sync + ?Sized,
    {
        let url = self.endpoint(path);
        tracing::debug!("GET {url}");

        let (status, body) = Self::execute(self.client.get(&url).query(query)).await?;
        decode(status, &body)
    }

    /// `POST` a JSON body and decode the JSON answer.
    ///
    /// # Errors
    /// Returns an error on connection failure, timeout, non-2xx status or malformed JSON.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let (status, raw) = self.post(path, body).await?;
        decode(status, &raw)
    }

    /// `POST` a JSON body, only checking the status of the answer.
    ///
    /// # Errors
    /// Returns an error on connection failure, timeout or non-2xx status.
    pub async fn post_empty<B>(&self, path: &str, body: &B) -> ApiResult<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.post(path, body).await.map(|_| ())
    }

    async fn post<B>(&self, path: &str, body: &B) -> ApiResult<(u16, String)>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.endpoint(path);
        tracing::debug!("POST {url}");
        Self::execute(self.client.post(&url).json(body)).await
    }

    async fn execute(request: reqwest::RequestBuilder) -> ApiResult<(u16, String)> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok((status.as_u16(), body))
    }

    /// Service liveness payload from `GET /health`.
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable or answers badly.
    pub async fn health(&self) -> ApiResult<serde_json::Value> {
        self.get_json("/health").await
    }

    /// Detailed service status from `GET /status`.
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable or answers badly.
    pub async fn status(&self) -> ApiResult<serde_json::Value> {
        self.get_json("/status").await
    }

    /// Index statistics from `GET /search/stats`.
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable or answers badly.
    pub async fn search_stats(&self) -> ApiResult<SearchStats> {
        self.get_json("/search/stats").await
    }
}

impl PharmaApi for ApiClient {
    fn chat(&self, request: ChatRequest) -> ApiFuture<'_, ApiResult<ChatResponse>> {
        Box::pin(async move { self.post_json("/chat", &request).await })
    }

    fn clear_session(&self, session_id: SessionId) -> ApiFuture<'_, ApiResult<()>> {
        Box::pin(async move {
            let body = ClearSessionRequest {
                session_id: &session_id,
            };
            self.post_empty("/chat/clear", &body).await
        })
    }

    fn search(&self, params: SearchParams) -> ApiFuture<'_, ApiResult<SearchResponse>> {
        Box::pin(async move { self.get_json_with("/search", &params).await })
    }
}

fn decode<T: DeserializeOwned>(status: u16, body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|source| TransportError::Decode { status, source })
}
