//! Paginated view of a remote collection.
//!
//! [`CollectionCursor`] holds the prefix of the collection loaded so far, the
//! opaque token for the next page, and the last total reported by the server.
//!
//! - [`reset`](CollectionCursor::reset) replaces everything with page one.
//! - [`load_more`](CollectionCursor::load_more) appends the next page.
//!
//! `loaded` is always a prefix, in server order, of the collection as of the
//! last successful fetch. It may be stale between reloads but is never
//! reordered, and a failed fetch leaves it untouched.

use async_trait::async_trait;
use tracing::debug;

use crate::backend::QaBackend;
use crate::error::{Error, Result};
use crate::models::{CollectionSettings, OffsetToken, Page, QaItem};

/// Refetch authoritative state after a mutation.
///
/// Required by every reconciler mutation and by the staging commit, so the
/// coupling between "mutate" and "refetch" is part of the interface.
#[async_trait]
pub trait Reload: Send {
    async fn reload(&mut self, backend: &dyn QaBackend) -> Result<()>;
}

/// Locally cached, paginated view of one remote collection.
#[derive(Debug, Clone)]
pub struct CollectionCursor {
    settings: CollectionSettings,
    loaded: Vec<QaItem>,
    next_offset: Option<OffsetToken>,
    total: u64,
    primed: bool,
}

impl CollectionCursor {
    pub fn new(settings: CollectionSettings) -> Self {
        Self {
            settings,
            loaded: Vec::new(),
            next_offset: None,
            total: 0,
            primed: false,
        }
    }

    /// Fetch the first page and replace the cursor state with it.
    pub async fn reset(&mut self, backend: &dyn QaBackend) -> Result<Page> {
        self.check_page_size()?;
        debug!(
            collection = %self.settings.name,
            limit = self.settings.page_size,
            "cursor reset"
        );
        let page = backend
            .fetch_page(&self.settings.name, self.settings.page_size, None)
            .await?;

        self.loaded = page.items.clone();
        self.next_offset = page.next_offset.clone();
        self.total = page.total;
        self.primed = true;
        Ok(page)
    }

    /// Fetch the page after the last one received and append it.
    ///
    /// Fails with [`Error::Precondition`] when the cursor was never reset or
    /// the collection is exhausted. Items are appended as received; the
    /// server's offset contract is trusted, so nothing is deduplicated.
    pub async fn load_more(&mut self, backend: &dyn QaBackend) -> Result<Page> {
        self.check_page_size()?;
        let offset = match (&self.next_offset, self.primed) {
            (Some(token), _) => token.clone(),
            (None, false) => {
                return Err(Error::Precondition(
                    "cursor has not been reset yet".to_string(),
                ))
            }
            (None, true) => {
                return Err(Error::Precondition(
                    "collection is exhausted; no further pages".to_string(),
                ))
            }
        };
        debug!(
            collection = %self.settings.name,
            offset = %offset,
            "cursor load more"
        );
        let page = backend
            .fetch_page(&self.settings.name, self.settings.page_size, Some(&offset))
            .await?;

        self.loaded.extend(page.items.iter().cloned());
        self.next_offset = page.next_offset.clone();
        self.total = page.total;
        Ok(page)
    }

    pub fn settings(&self) -> &CollectionSettings {
        &self.settings
    }

    pub fn collection(&self) -> &str {
        &self.settings.name
    }

    pub fn loaded(&self) -> &[QaItem] {
        &self.loaded
    }

    pub fn next_offset(&self) -> Option<&OffsetToken> {
        self.next_offset.as_ref()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// True once a reset succeeded.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// True when another [`load_more`](Self::load_more) can succeed.
    pub fn has_more(&self) -> bool {
        self.next_offset.is_some()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.loaded.iter().any(|item| item.id.as_deref() == Some(id))
    }

    fn check_page_size(&self) -> Result<()> {
        if self.settings.page_size == 0 {
            return Err(Error::invalid("page size must be > 0"));
        }
        Ok(())
    }
}

#[async_trait]
impl Reload for CollectionCursor {
    async fn reload(&mut self, backend: &dyn QaBackend) -> Result<()> {
        self.reset(backend).await.map(|_| ())
    }
}
