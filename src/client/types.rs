//! Wire types exchanged with the `PharmaBot` backend.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::session::SessionId;

/// Author of a conversational turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turn typed by the pharmacist.
    User,
    /// Turn produced by the backend (or the local fallback).
    Assistant,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Knowledge bases an assistant answer may cite.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Vidal drug monographs.
    Vidal,
    /// Meddispar dispensing rules.
    Meddispar,
}

impl SourceType {
    /// Wire name, also used as the `source_type` search filter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vidal => "vidal",
            Self::Meddispar => "meddispar",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citation attached to an assistant answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Document title.
    pub title: String,
    /// Snippet backing the answer.
    pub content: String,
    /// Link to the original document.
    pub url: String,
    /// Knowledge base the snippet comes from.
    pub source_type: SourceType,
    /// Backend relevance in `[0, 1]`, displayed as-is.
    pub relevance_score: f32,
}

/// One conversational turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the turn.
    pub role: Role,
    /// Text of the turn (markdown for assistant turns).
    pub content: String,
    /// ISO-8601 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Citations, only on assistant turns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl Message {
    /// Build a user turn stamped with the current time.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Some(now_timestamp()),
            sources: Vec::new(),
        }
    }

    /// Build an assistant turn from a backend answer.
    #[must_use]
    pub fn assistant(content: impl Into<String>, timestamp: String, sources: Vec<Source>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(timestamp),
            sources,
        }
    }

    /// Build a local assistant turn with no sources, stamped with the current time.
    #[must_use]
    pub fn local_assistant(content: impl Into<String>) -> Self {
        Self::assistant(content, now_timestamp(), Vec::new())
    }
}

/// Current UTC time in the `2024-01-01T00:00:00.000Z` form.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body of `POST /chat`.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    /// The new utterance.
    pub message: String,
    /// Conversation prior to the new utterance.
    pub conversation_history: Vec<Message>,
    /// Current session, absent to start a new one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

/// Body returned by `POST /chat`.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatResponse {
    /// Assistant answer (markdown).
    pub response: String,
    /// Citations backing the answer.
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Session to use on the next turn.
    pub session_id: SessionId,
    /// Server-side timestamp of the answer.
    pub timestamp: String,
    /// Tokens consumed by the completion, when reported.
    #[serde(default)]
    pub tokens_used: Option<u64>,
}

/// Body of `POST /chat/clear`.
#[derive(Clone, Debug, Serialize)]
pub struct ClearSessionRequest<'a> {
    /// Session to release.
    pub session_id: &'a SessionId,
}

/// Query parameters of `GET /search`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    /// Query text.
    pub q: String,
    /// Optional `source_type` filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Maximum number of results.
    pub limit: usize,
}

/// A ranked hit from `GET /search`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document title.
    pub title: String,
    /// Matching snippet.
    pub content: String,
    /// Link to the original document (may be empty).
    #[serde(default)]
    pub url: String,
    /// Index category; open-ended, unlike chat citations.
    pub source_type: String,
    /// Backend relevance in `[0, 1]`, displayed as-is.
    pub relevance_score: f32,
}

/// Body returned by `GET /search`.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchResponse {
    /// Query echoed by the backend.
    pub query: String,
    /// Hits in relevance order.
    #[serde(default)]
    pub results: Vec<SearchResult>,
    /// Number of hits reported by the backend.
    #[serde(default)]
    pub total_results: usize,
}

/// Body returned by `GET /search/stats`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of indexed chunks.
    #[serde(default)]
    pub total_documents: u64,
    /// Embedding model used by the index.
    #[serde(default)]
    pub embedding_model: Option<String>,
    /// Completion model behind `/chat`.
    #[serde(default)]
    pub llm_model: Option<String>,
    /// Chunk size used at ingestion.
    #[serde(default)]
    pub chunk_size: Option<u64>,
    /// Display names of the indexed knowledge bases.
    #[serde(default)]
    pub sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_omits_missing_session() {
        let request = ChatRequest {
            message: "Posologie de l'amoxicilline".to_string(),
            conversation_history: Vec::new(),
            session_id: None,
        };
        let json = serde_json::to_value(&request).ok();
        let json = json.unwrap_or_default();
        assert!(json.get("session_id").is_none());
        assert_eq!(json["conversation_history"], serde_json::json!([]));
    }

    #[test]
    fn test_history_message_shape() {
        let message = Message::assistant(
            "Antalgique",
            "2024-01-01T00:00:00Z".to_string(),
            Vec::new(),
        );
        let json = serde_json::to_value(&message).unwrap_or_default();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["timestamp"], "2024-01-01T00:00:00Z");
        assert!(json.get("sources").is_none());
    }

    #[test]
    fn test_chat_response_parses_backend_payload() {
        let body = r#"{
            "response": "Antalgique...",
            "sources": [{
                "title": "Paracétamol",
                "content": "Douleurs et fièvre",
                "url": "https://www.vidal.fr/medicaments/substances/paracetamol-2649.html",
                "source_type": "vidal",
                "relevance_score": 0.9
            }],
            "session_id": "abc123",
            "timestamp": "2024-01-01T00:00:00Z",
            "tokens_used": null
        }"#;
        let parsed: Option<ChatResponse> = serde_json::from_str(body).ok();
        assert!(parsed.is_some());
        if let Some(response) = parsed {
            assert_eq!(response.session_id.as_str(), "abc123");
            assert_eq!(response.sources.len(), 1);
            assert_eq!(response.sources[0].source_type, SourceType::Vidal);
            assert!(response.tokens_used.is_none());
        }
    }

    #[test]
    fn test_chat_source_type_is_closed() {
        let body = r#"{"title":"x","content":"y","url":"","source_type":"unknown","relevance_score":0.1}"#;
        assert!(serde_json::from_str::<Source>(body).is_err());
        assert!(serde_json::from_str::<SearchResult>(body).is_ok());
    }

    #[test]
    fn test_search_params_omit_missing_filter() {
        let params = SearchParams {
            q: "aspirine".to_string(),
            source_type: None,
            limit: 20,
        };
        let json = serde_json::to_value(&params).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"q": "aspirine", "limit": 20}));
    }

    #[test]
    fn test_now_timestamp_is_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
