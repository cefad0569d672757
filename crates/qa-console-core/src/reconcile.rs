//! Create, update, and delete against the remote collection.
//!
//! Every successful mutation is followed by a forced reload through the
//! caller's [`Reload`] implementation; no server response is merged into
//! local state. The reconciler only signals outcomes. Presenting them to a
//! user is the job of a separate observer.
//!
//! Callers must not issue a second mutation for the same item while a prior
//! mutation and its reload are still in flight. Nothing here tracks
//! in-flight requests.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::QaBackend;
use crate::cursor::Reload;
use crate::error::{Error, Result};
use crate::models::{QaDraft, QaItem};

pub struct Reconciler {
    backend: Arc<dyn QaBackend>,
    collection: String,
}

impl Reconciler {
    pub fn new(backend: Arc<dyn QaBackend>, collection: impl Into<String>) -> Self {
        Self {
            backend,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn backend(&self) -> &dyn QaBackend {
        self.backend.as_ref()
    }

    /// Submit one new item, then reload.
    ///
    /// The returned item carries no id: the server-assigned id becomes
    /// visible only through the reload.
    pub async fn create(
        &self,
        question: &str,
        answer: &str,
        reload: &mut dyn Reload,
    ) -> Result<QaItem> {
        let draft = QaDraft::new(question, answer);
        self.backend
            .insert_item(&self.collection, &draft)
            .await
            .inspect_err(|e| warn!(collection = %self.collection, error = %e, "create failed"))?;
        info!(collection = %self.collection, "created item");

        self.reconcile(reload).await?;
        Ok(QaItem {
            id: None,
            question: draft.question,
            answer: draft.answer,
        })
    }

    /// Overwrite the item `id`, then reload.
    pub async fn update(
        &self,
        id: &str,
        question: &str,
        answer: &str,
        reload: &mut dyn Reload,
    ) -> Result<QaItem> {
        let id = require_id(id)?;
        let draft = QaDraft::new(question, answer);
        self.backend
            .update_item(&self.collection, id, &draft)
            .await
            .inspect_err(|e| warn!(collection = %self.collection, id, error = %e, "update failed"))?;
        info!(collection = %self.collection, id, "updated item");

        self.reconcile(reload).await?;
        Ok(QaItem {
            id: Some(id.to_string()),
            question: draft.question,
            answer: draft.answer,
        })
    }

    /// Delete the item `id`, then reload.
    pub async fn delete(&self, id: &str, reload: &mut dyn Reload) -> Result<()> {
        let id = require_id(id)?;
        self.backend
            .delete_item(&self.collection, id)
            .await
            .inspect_err(|e| warn!(collection = %self.collection, id, error = %e, "delete failed"))?;
        info!(collection = %self.collection, id, "deleted item");

        self.reconcile(reload).await
    }

    async fn reconcile(&self, reload: &mut dyn Reload) -> Result<()> {
        reload
            .reload(self.backend.as_ref())
            .await
            .map_err(|e| Error::Reload(Box::new(e)))
    }
}

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::invalid("item id is required"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::cursor::CollectionCursor;
    use crate::models::CollectionSettings;

    fn setup(count: usize) -> (Arc<InMemoryBackend>, Reconciler, CollectionCursor) {
        let backend = Arc::new(InMemoryBackend::new().with_collection("CustomAi"));
        backend.seed("CustomAi", count);
        let reconciler = Reconciler::new(backend.clone(), "CustomAi");
        let cursor = CollectionCursor::new(CollectionSettings::new("CustomAi", 25));
        (backend, reconciler, cursor)
    }

    #[tokio::test]
    async fn delete_then_reload_drops_the_item() {
        let (backend, reconciler, mut cursor) = setup(3);
        cursor.reset(backend.as_ref()).await.unwrap();
        let id = cursor.loaded()[1].id.clone().unwrap();

        reconciler.delete(&id, &mut cursor).await.unwrap();
        assert!(!cursor.contains_id(&id));
        assert_eq!(cursor.total(), 2);
        assert_eq!(backend.calls(), vec!["fetch_page", "delete_item", "fetch_page"]);
    }

    #[tokio::test]
    async fn create_is_observed_only_through_reload() {
        let (backend, reconciler, mut cursor) = setup(1);
        cursor.reset(backend.as_ref()).await.unwrap();

        let created = reconciler
            .create("What is a cursor?", "An opaque token.", &mut cursor)
            .await
            .unwrap();
        assert_eq!(created.id, None);
        assert_eq!(cursor.total(), 2);
        assert!(cursor
            .loaded()
            .iter()
            .any(|item| item.question == "What is a cursor?" && item.id.is_some()));
    }

    #[tokio::test]
    async fn update_requires_an_id() {
        let (backend, reconciler, mut cursor) = setup(1);
        let err = reconciler
            .update("  ", "q", "a", &mut cursor)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_and_reloads() {
        let (backend, reconciler, mut cursor) = setup(2);
        cursor.reset(backend.as_ref()).await.unwrap();
        let id = cursor.loaded()[0].id.clone().unwrap();

        let updated = reconciler
            .update(&id, "New question", "New answer", &mut cursor)
            .await
            .unwrap();
        assert_eq!(updated.id.as_deref(), Some(id.as_str()));
        assert_eq!(cursor.loaded()[0].question, "New question");
        assert_eq!(cursor.loaded()[1].question, "Question 2");
    }

    #[tokio::test]
    async fn remote_failure_skips_reload_and_keeps_state() {
        let (backend, reconciler, mut cursor) = setup(2);
        cursor.reset(backend.as_ref()).await.unwrap();
        let before = cursor.loaded().to_vec();

        let err = reconciler.delete("missing", &mut cursor).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(cursor.loaded(), before.as_slice());
        assert_eq!(backend.call_count("fetch_page"), 1);
    }

    #[tokio::test]
    async fn reload_failure_is_reported_after_applied_mutation() {
        let (backend, reconciler, mut cursor) = setup(2);
        cursor.reset(backend.as_ref()).await.unwrap();
        let id = cursor.loaded()[0].id.clone().unwrap();

        backend.fail_next_op("fetch_page", 503, "unavailable");
        let err = reconciler.delete(&id, &mut cursor).await.unwrap_err();
        assert!(matches!(err, Error::Reload(_)));
        assert_eq!(err.status(), Some(503));
        assert_eq!(backend.items("CustomAi").len(), 1);
        // Local view is stale until the next successful reset.
        assert!(cursor.contains_id(&id));
    }
}
