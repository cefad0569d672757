//! Backend abstraction for QA Console.
//!
//! The [`QaBackend`] trait is the only way the cursor, reconciler, staging
//! area, and chat session reach the server. The HTTP implementation lives in
//! the `qa-console` crate; [`memory::InMemoryBackend`] is used for tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{DocumentUpload, OffsetToken, Page, QaDraft, SearchAnswer, UploadResponse};

/// Abstract Q&A backend.
///
/// Every method maps to one request against the server. Methods returning
/// [`Value`] hand back the parsed status body; callers must not trust its
/// shape beyond "the request succeeded".
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`fetch_page`](QaBackend::fetch_page) | Paginated fetch |
/// | [`insert_item`](QaBackend::insert_item) | Create one item |
/// | [`update_item`](QaBackend::update_item) | Overwrite one item by id |
/// | [`delete_item`](QaBackend::delete_item) | Delete one item by id |
/// | [`bulk_insert`](QaBackend::bulk_insert) | Insert a batch in one request |
/// | [`upload_document`](QaBackend::upload_document) | Upload a file and generate pairs |
/// | [`search`](QaBackend::search) | Answer a chat query |
/// | [`create_collection`](QaBackend::create_collection) | Create a collection |
/// | [`delete_collection`](QaBackend::delete_collection) | Drop a collection |
/// | [`count_items`](QaBackend::count_items) | Total items in a collection |
#[async_trait]
pub trait QaBackend: Send + Sync {
    /// Fetch up to `limit` items starting at `offset` (first page when `None`).
    async fn fetch_page(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<&OffsetToken>,
    ) -> Result<Page>;

    async fn insert_item(&self, collection: &str, draft: &QaDraft) -> Result<Value>;

    async fn update_item(&self, collection: &str, id: &str, draft: &QaDraft) -> Result<Value>;

    async fn delete_item(&self, collection: &str, id: &str) -> Result<Value>;

    async fn bulk_insert(&self, collection: &str, drafts: &[QaDraft]) -> Result<Value>;

    async fn upload_document(
        &self,
        collection: &str,
        upload: DocumentUpload,
    ) -> Result<UploadResponse>;

    async fn search(&self, collection: &str, query: &str) -> Result<SearchAnswer>;

    async fn create_collection(&self, name: &str) -> Result<Value>;

    async fn delete_collection(&self, name: &str) -> Result<Value>;

    async fn count_items(&self, collection: &str) -> Result<u64>;
}
