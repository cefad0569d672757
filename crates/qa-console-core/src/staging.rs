//! Review staging area for machine-generated Q&A pairs.
//!
//! An upload produces a batch of candidate pairs that are reviewed locally
//! (edited, removed, supplemented) and then committed to the collection in a
//! single bulk request.
//!
//! Items are addressed by a [`StagedKey`] assigned from a monotonic counter,
//! so removing one item never changes how the others are addressed. Keys are
//! never reused, also across re-ingests. Positional helpers
//! ([`edit_at`](StagingArea::edit_at), [`remove_at`](StagingArea::remove_at))
//! exist for callers that only know a display index.
//!
//! Commit treats any 2xx as total success and clears the batch, and any
//! failure as total failure that leaves the batch intact for retry. Whether
//! the backend applies a bulk request atomically is not known to the client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::QaBackend;
use crate::cursor::Reload;
use crate::error::{Error, Result};
use crate::models::{BulkOutcome, QaDraft, UploadResponse};

/// Stable local identifier of a staged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StagedKey(u64);

impl StagedKey {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for StagedKey {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl fmt::Display for StagedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editable field of a staged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Question,
    Answer,
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "question" | "q" => Ok(Field::Question),
            "answer" | "a" => Ok(Field::Answer),
            other => Err(Error::invalid(format!(
                "unknown field '{}': expected question or answer",
                other
            ))),
        }
    }
}

/// A candidate pair that has not been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedItem {
    key: StagedKey,
    pub question: String,
    pub answer: String,
}

impl StagedItem {
    pub fn key(&self) -> StagedKey {
        self.key
    }

    fn draft(&self) -> QaDraft {
        QaDraft::new(self.question.clone(), self.answer.clone())
    }
}

/// Counters describing where the current batch came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    /// Chunks the uploaded document was split into.
    pub chunk_count: u64,
    /// Pairs the backend generated from those chunks.
    pub generated_count: u64,
    /// Pairs appended by hand since the last ingest.
    pub added_count: u64,
}

/// The transient, not-yet-persisted batch for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingArea {
    collection: String,
    items: Vec<StagedItem>,
    stats: SourceStats,
    #[serde(default)]
    message: Option<String>,
    next_key: u64,
}

impl StagingArea {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            items: Vec::new(),
            stats: SourceStats::default(),
            message: None,
            next_key: 1,
        }
    }

    /// Replace the whole batch with the pairs of an upload response.
    pub fn ingest(&mut self, response: UploadResponse) -> &[StagedItem] {
        let items: Vec<StagedItem> = response
            .qa_pairs
            .into_iter()
            .map(|draft| StagedItem {
                key: self.assign_key(),
                question: draft.question,
                answer: draft.answer,
            })
            .collect();
        self.items = items;
        self.stats = SourceStats {
            chunk_count: response.total_chunks,
            generated_count: response.total_qa_generated,
            added_count: 0,
        };
        self.message = (!response.message.is_empty()).then_some(response.message);
        info!(
            collection = %self.collection,
            staged = self.items.len(),
            chunks = self.stats.chunk_count,
            "ingested upload into staging"
        );
        &self.items
    }

    /// Overwrite one field of the item `key`.
    pub fn edit(&mut self, key: StagedKey, field: Field, value: impl Into<String>) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.key == key)
            .ok_or(Error::UnknownKey(key))?;
        match field {
            Field::Question => item.question = value.into(),
            Field::Answer => item.answer = value.into(),
        }
        Ok(())
    }

    /// Overwrite one field of the item currently at `index`.
    pub fn edit_at(&mut self, index: usize, field: Field, value: impl Into<String>) -> Result<()> {
        let key = self.key_at(index)?;
        self.edit(key, field, value)
    }

    /// Remove the item `key`; the other items keep their keys.
    pub fn remove(&mut self, key: StagedKey) -> Result<StagedItem> {
        let pos = self
            .items
            .iter()
            .position(|item| item.key == key)
            .ok_or(Error::UnknownKey(key))?;
        Ok(self.items.remove(pos))
    }

    /// Remove the item currently at `index`. Later items shift down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<StagedItem> {
        let key = self.key_at(index)?;
        self.remove(key)
    }

    /// Append a hand-written pair. Both fields must contain non-whitespace text.
    pub fn append(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<StagedKey> {
        let question = question.into();
        let answer = answer.into();
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(Error::invalid("both question and answer are required"));
        }
        let key = self.assign_key();
        self.items.push(StagedItem {
            key,
            question,
            answer,
        });
        self.stats.added_count += 1;
        Ok(key)
    }

    /// Submit the whole batch as one bulk request, then reload.
    ///
    /// An empty batch is a no-op success: no request, no reload. On failure
    /// the batch is left exactly as it was. On success it is cleared before
    /// the reload runs, so a reload failure ([`Error::Reload`]) still means
    /// the batch was committed.
    pub async fn commit(
        &mut self,
        backend: &dyn QaBackend,
        reload: &mut dyn Reload,
    ) -> Result<BulkOutcome> {
        if self.items.is_empty() {
            return Ok(BulkOutcome::empty());
        }
        let drafts: Vec<QaDraft> = self.items.iter().map(StagedItem::draft).collect();
        let body = backend
            .bulk_insert(&self.collection, &drafts)
            .await
            .inspect_err(|e| {
                warn!(
                    collection = %self.collection,
                    staged = drafts.len(),
                    error = %e,
                    "bulk commit failed; batch kept"
                )
            })?;
        let outcome = BulkOutcome::from_response(drafts.len(), &body);
        info!(
            collection = %self.collection,
            submitted = outcome.submitted,
            "committed staged batch"
        );
        self.discard();

        reload
            .reload(backend)
            .await
            .map_err(|e| Error::Reload(Box::new(e)))?;
        Ok(outcome)
    }

    /// Drop the batch and its stats without committing.
    pub fn discard(&mut self) {
        self.items.clear();
        self.stats = SourceStats::default();
        self.message = None;
    }

    /// Point an empty staging area at another collection. The key counter
    /// carries over so keys stay unique.
    pub fn retarget(&mut self, collection: impl Into<String>) -> Result<()> {
        if !self.items.is_empty() {
            return Err(Error::Precondition(format!(
                "{} staged item(s) still belong to collection '{}'",
                self.items.len(),
                self.collection
            )));
        }
        self.collection = collection.into();
        self.stats = SourceStats::default();
        self.message = None;
        Ok(())
    }

    pub fn key_at(&self, index: usize) -> Result<StagedKey> {
        self.items.get(index).map(|item| item.key).ok_or(Error::Index {
            index,
            len: self.items.len(),
        })
    }

    pub fn get(&self, key: StagedKey) -> Option<&StagedItem> {
        self.items.iter().find(|item| item.key == key)
    }

    pub fn items(&self) -> &[StagedItem] {
        &self.items
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    /// Message returned by the backend with the last upload.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn assign_key(&mut self) -> StagedKey {
        let key = StagedKey(self.next_key);
        self.next_key += 1;
        key
    }
}
