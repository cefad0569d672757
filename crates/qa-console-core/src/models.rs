//! Core data models used throughout QA Console.
//!
//! These types represent the Q&A items, pages, and upload/search payloads
//! that flow between the backend and the cursor, reconciler, and staging area.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A persisted (or about to be persisted) question/answer pair.
///
/// `id` is assigned by the backend at persistence time and is `None` for
/// anything that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaItem {
    pub id: Option<String>,
    pub question: String,
    pub answer: String,
}

/// The `{question, answer}` body sent for single and bulk inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaDraft {
    pub question: String,
    pub answer: String,
}

impl QaDraft {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Opaque pagination token returned by the server.
///
/// The client never parses or constructs one; it only forwards the last
/// received value verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OffsetToken(String);

impl OffsetToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OffsetToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OffsetToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for OffsetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a remote collection. Immutable after receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<QaItem>,
    /// `None` means the collection is exhausted.
    pub next_offset: Option<OffsetToken>,
    /// Live server count of all items in the collection.
    pub total: u64,
}

/// Response of the document upload / QA generation step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadResponse {
    pub message: String,
    pub total_chunks: u64,
    pub total_qa_generated: u64,
    pub qa_pairs: Vec<QaDraft>,
}

/// A file handed to the upload endpoint.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Response of the search/chat endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchAnswer {
    pub user_question: Option<String>,
    pub human_like_answer: Option<String>,
    pub msg: Option<String>,
    pub top_points: Vec<serde_json::Value>,
}

/// Result of a bulk commit as reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Number of items sent in the request.
    pub submitted: usize,
    /// Count reported by the backend, when it reports one. The backend may
    /// apply a bulk request partially; this number is informational only.
    pub inserted_count: Option<u64>,
}

impl BulkOutcome {
    pub fn empty() -> Self {
        Self {
            submitted: 0,
            inserted_count: None,
        }
    }

    /// Build an outcome from the backend's bulk insert response body.
    pub fn from_response(submitted: usize, body: &serde_json::Value) -> Self {
        Self {
            submitted,
            inserted_count: body.get("inserted_count").and_then(|v| v.as_u64()),
        }
    }
}

/// The collection a component works against and how many items it fetches
/// per page. Passed explicitly to every component constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSettings {
    pub name: String,
    pub page_size: usize,
}

impl CollectionSettings {
    pub fn new(name: impl Into<String>, page_size: usize) -> Self {
        Self {
            name: name.into(),
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_outcome_reads_inserted_count() {
        let body = serde_json::json!({ "inserted_count": 3, "qdrant_response": {} });
        let outcome = BulkOutcome::from_response(3, &body);
        assert_eq!(outcome.inserted_count, Some(3));

        let outcome = BulkOutcome::from_response(2, &serde_json::json!({ "status": "ok" }));
        assert_eq!(outcome.submitted, 2);
        assert_eq!(outcome.inserted_count, None);
    }

    #[test]
    fn offset_token_is_forwarded_verbatim() {
        let token = OffsetToken::from("8c0e-uuid-like");
        assert_eq!(token.as_str(), "8c0e-uuid-like");
        assert_eq!(
            serde_json::to_string(&token).unwrap(),
            "\"8c0e-uuid-like\""
        );
    }
}
