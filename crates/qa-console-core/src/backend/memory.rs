//! In-memory [`QaBackend`] implementation for tests.
//!
//! Uses ordered `Vec`s per collection behind `std::sync::RwLock`. Offsets are
//! decimal positions, ids are assigned from a counter, and search is a
//! term-overlap match over stored questions.
//!
//! Failures can be injected for the next call (of any operation or of one
//! named operation), and every call is recorded so tests can assert which
//! requests were made.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::models::{
    DocumentUpload, OffsetToken, Page, QaDraft, QaItem, SearchAnswer, UploadResponse,
};

use super::QaBackend;

#[derive(Debug, Clone)]
struct StoredPoint {
    id: String,
    question: String,
    answer: String,
}

impl StoredPoint {
    fn to_item(&self) -> QaItem {
        QaItem {
            id: Some(self.id.clone()),
            question: self.question.clone(),
            answer: self.answer.clone(),
        }
    }
}

#[derive(Debug, Clone)]
enum Injected {
    Remote { status: u16, body: String },
    Network(String),
}

impl Injected {
    fn into_error(self) -> Error {
        match self {
            Injected::Remote { status, body } => Error::Remote { status, body },
            Injected::Network(msg) => Error::Network(msg),
        }
    }
}

/// In-memory backend for unit and integration tests.
pub struct InMemoryBackend {
    collections: RwLock<BTreeMap<String, Vec<StoredPoint>>>,
    next_id: AtomicU64,
    upload_response: RwLock<UploadResponse>,
    failures: Mutex<Vec<(Option<&'static str>, Injected)>>,
    calls: Mutex<Vec<&'static str>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            upload_response: RwLock::new(UploadResponse {
                message: "Processing complete".to_string(),
                ..Default::default()
            }),
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create an empty collection.
    pub fn with_collection(self, name: &str) -> Self {
        self.collections
            .write()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        self
    }

    /// Store `count` generated items (`Question n` / `Answer n`) in `name`.
    pub fn seed(&self, name: &str, count: usize) -> Vec<String> {
        let mut ids = Vec::with_capacity(count);
        let mut collections = self.collections.write().unwrap();
        let points = collections.entry(name.to_string()).or_default();
        for n in 1..=count {
            let id = self.assign_id();
            points.push(StoredPoint {
                id: id.clone(),
                question: format!("Question {}", n),
                answer: format!("Answer {}", n),
            });
            ids.push(id);
        }
        ids
    }

    /// Response returned by the next uploads.
    pub fn set_upload_response(&self, response: UploadResponse) {
        *self.upload_response.write().unwrap() = response;
    }

    /// Fail the next call, whatever operation it is, with a remote error.
    pub fn fail_next(&self, status: u16, body: &str) {
        self.failures.lock().unwrap().push((
            None,
            Injected::Remote {
                status,
                body: body.to_string(),
            },
        ));
    }

    /// Fail the next call of `operation` (e.g. `"fetch_page"`) with a remote error.
    pub fn fail_next_op(&self, operation: &'static str, status: u16, body: &str) {
        self.failures.lock().unwrap().push((
            Some(operation),
            Injected::Remote {
                status,
                body: body.to_string(),
            },
        ));
    }

    /// Fail the next call with a transport error.
    pub fn fail_next_network(&self, msg: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((None, Injected::Network(msg.to_string())));
    }

    /// Names of the operations called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made to `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == operation)
            .count()
    }

    /// Current contents of a collection, in storage order.
    pub fn items(&self, name: &str) -> Vec<QaItem> {
        self.collections
            .read()
            .unwrap()
            .get(name)
            .map(|points| points.iter().map(StoredPoint::to_item).collect())
            .unwrap_or_default()
    }

    fn assign_id(&self) -> String {
        format!("qa-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn enter(&self, operation: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(operation);
        let mut failures = self.failures.lock().unwrap();
        let pos = failures
            .iter()
            .position(|(op, _)| op.map_or(true, |op| op == operation));
        match pos {
            Some(pos) => Err(failures.remove(pos).1.into_error()),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_collection(name: &str) -> Error {
    Error::remote(
        404,
        json!({ "error": format!("Collection '{}' not found", name) }).to_string(),
    )
}

fn terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl QaBackend for InMemoryBackend {
    async fn fetch_page(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<&OffsetToken>,
    ) -> Result<Page> {
        self.enter("fetch_page")?;
        let collections = self.collections.read().unwrap();
        let points = collections
            .get(collection)
            .ok_or_else(|| missing_collection(collection))?;

        let start = match offset {
            Some(token) => token.as_str().parse::<usize>().map_err(|_| {
                Error::remote(400, json!({ "error": "invalid offset" }).to_string())
            })?,
            None => 0,
        };
        let start = start.min(points.len());
        let end = start.saturating_add(limit).min(points.len());

        Ok(Page {
            items: points[start..end].iter().map(StoredPoint::to_item).collect(),
            next_offset: (end < points.len()).then(|| OffsetToken::from(end.to_string())),
            total: points.len() as u64,
        })
    }

    async fn insert_item(&self, collection: &str, draft: &QaDraft) -> Result<Value> {
        self.enter("insert_item")?;
        let mut collections = self.collections.write().unwrap();
        let points = collections.get_mut(collection).ok_or_else(|| {
            Error::remote(
                400,
                json!({ "error": format!("Collection '{}' does not exist.", collection) })
                    .to_string(),
            )
        })?;
        points.push(StoredPoint {
            id: self.assign_id(),
            question: draft.question.clone(),
            answer: draft.answer.clone(),
        });
        Ok(json!({ "result": { "status": "completed" }, "status": "ok" }))
    }

    async fn update_item(&self, collection: &str, id: &str, draft: &QaDraft) -> Result<Value> {
        self.enter("update_item")?;
        let mut collections = self.collections.write().unwrap();
        let points = collections
            .get_mut(collection)
            .ok_or_else(|| missing_collection(collection))?;
        // Upsert: an unknown id is stored as a new point.
        match points.iter_mut().find(|p| p.id == id) {
            Some(point) => {
                point.question = draft.question.clone();
                point.answer = draft.answer.clone();
            }
            None => points.push(StoredPoint {
                id: id.to_string(),
                question: draft.question.clone(),
                answer: draft.answer.clone(),
            }),
        }
        Ok(json!({
            "success": true,
            "message": format!("Point {} updated successfully in collection {}", id, collection)
        }))
    }

    async fn delete_item(&self, collection: &str, id: &str) -> Result<Value> {
        self.enter("delete_item")?;
        let mut collections = self.collections.write().unwrap();
        let points = collections
            .get_mut(collection)
            .ok_or_else(|| missing_collection(collection))?;
        let before = points.len();
        points.retain(|p| p.id != id);
        if points.len() == before {
            return Err(Error::remote(
                404,
                json!({
                    "error": format!(
                        "Question with id '{}' not found in collection '{}'",
                        id, collection
                    )
                })
                .to_string(),
            ));
        }
        Ok(json!({
            "message": format!(
                "Question with id '{}' deleted successfully from collection '{}'",
                id, collection
            )
        }))
    }

    async fn bulk_insert(&self, collection: &str, drafts: &[QaDraft]) -> Result<Value> {
        self.enter("bulk_insert")?;
        if drafts.is_empty() {
            return Err(Error::remote(
                400,
                json!({ "error": "No items provided" }).to_string(),
            ));
        }
        let mut collections = self.collections.write().unwrap();
        let points = collections
            .get_mut(collection)
            .ok_or_else(|| missing_collection(collection))?;
        for draft in drafts {
            points.push(StoredPoint {
                id: self.assign_id(),
                question: draft.question.clone(),
                answer: draft.answer.clone(),
            });
        }
        Ok(json!({ "inserted_count": drafts.len(), "qdrant_response": { "status": "ok" } }))
    }

    async fn upload_document(
        &self,
        _collection: &str,
        upload: DocumentUpload,
    ) -> Result<UploadResponse> {
        self.enter("upload_document")?;
        if upload.bytes.is_empty() {
            return Err(Error::remote(
                400,
                json!({ "error": "No file part" }).to_string(),
            ));
        }
        Ok(self.upload_response.read().unwrap().clone())
    }

    async fn search(&self, collection: &str, query: &str) -> Result<SearchAnswer> {
        self.enter("search")?;
        let collections = self.collections.read().unwrap();
        let points = collections
            .get(collection)
            .ok_or_else(|| missing_collection(collection))?;

        let query_terms = terms(query);
        let mut scored: Vec<(usize, &StoredPoint)> = points
            .iter()
            .map(|p| {
                let question_terms = terms(&p.question);
                let score = query_terms
                    .iter()
                    .filter(|t| question_terms.contains(t))
                    .count();
                (score, p)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(5);

        let top_points: Vec<Value> = scored
            .iter()
            .map(|(score, p)| {
                json!({
                    "id": p.id,
                    "score": score,
                    "payload": { "question": p.question, "answer": p.answer }
                })
            })
            .collect();

        Ok(match scored.first() {
            Some((_, best)) => SearchAnswer {
                user_question: Some(query.to_string()),
                human_like_answer: Some(best.answer.clone()),
                msg: Some("these are the matched points(questions) from qdrant".to_string()),
                top_points,
            },
            None => SearchAnswer {
                user_question: Some(query.to_string()),
                human_like_answer: Some("0".to_string()),
                msg: Some("No matched points found in Qdrant".to_string()),
                top_points,
            },
        })
    }

    async fn create_collection(&self, name: &str) -> Result<Value> {
        self.enter("create_collection")?;
        let mut collections = self.collections.write().unwrap();
        if collections.contains_key(name) {
            return Err(Error::remote(
                409,
                json!({ "error": format!("Collection '{}' already exists", name) }).to_string(),
            ));
        }
        collections.insert(name.to_string(), Vec::new());
        Ok(json!({ "result": true, "status": "ok" }))
    }

    async fn delete_collection(&self, name: &str) -> Result<Value> {
        self.enter("delete_collection")?;
        let mut collections = self.collections.write().unwrap();
        if collections.remove(name).is_none() {
            return Err(missing_collection(name));
        }
        Ok(json!({ "message": format!("Collection '{}' removed successfully", name) }))
    }

    async fn count_items(&self, collection: &str) -> Result<u64> {
        self.enter("count_items")?;
        let collections = self.collections.read().unwrap();
        collections
            .get(collection)
            .map(|points| points.len() as u64)
            .ok_or_else(|| missing_collection(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pages_walk_the_collection_in_order() {
        let backend = InMemoryBackend::new();
        backend.seed("docs", 5);

        let first = backend.fetch_page("docs", 2, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total, 5);
        assert_eq!(first.next_offset, Some(OffsetToken::from("2")));

        let last = backend
            .fetch_page("docs", 10, first.next_offset.as_ref())
            .await
            .unwrap();
        assert_eq!(last.items.len(), 3);
        assert_eq!(last.items[0].question, "Question 3");
        assert!(last.next_offset.is_none());
    }

    #[tokio::test]
    async fn injected_failure_targets_named_operation() {
        let backend = InMemoryBackend::new().with_collection("docs");
        backend.fail_next_op("bulk_insert", 500, "boom");

        assert!(backend.fetch_page("docs", 10, None).await.is_ok());
        let err = backend
            .bulk_insert("docs", &[QaDraft::new("q", "a")])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(backend.calls(), vec!["fetch_page", "bulk_insert"]);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let backend = InMemoryBackend::new().with_collection("docs");
        let err = backend.delete_item("docs", "nope").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn search_without_match_returns_sentinel() {
        let backend = InMemoryBackend::new().with_collection("docs");
        backend
            .insert_item("docs", &QaDraft::new("What is Rust?", "A language."))
            .await
            .unwrap();

        let hit = backend.search("docs", "rust").await.unwrap();
        assert_eq!(hit.human_like_answer.as_deref(), Some("A language."));
        assert_eq!(hit.top_points.len(), 1);

        let miss = backend.search("docs", "kubernetes").await.unwrap();
        assert_eq!(miss.human_like_answer.as_deref(), Some("0"));
        assert!(miss.top_points.is_empty());
    }
}
