//! Paginated comment feed with optimistic upvotes.
//!
//! The feed shows the newest `page_size` comments first and offers to load
//! the rest in one go. Upvotes update the local flag and the displayed count
//! before the store acknowledges. A rejected increment is logged and returned;
//! the local state is not reconciled and may drift from the stored count.

pub mod relative_time;

pub use relative_time::{format_relative, RelativeTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{
    CollectionPath, DocumentId, DocumentQuery, DocumentStore, PageCursor, StoredDocument,
};
use crate::infrastructure::preferences::PreferenceStore;
use crate::models::comment::{TIMESTAMP_FIELD, UPVOTES_FIELD};
use crate::models::{CommentEntry, NewComment, SortDirection};

pub const DEFAULT_PAGE_SIZE: u32 = 5;

pub const EMPTY_MESSAGE: &str = "Noch keine Kommentare. Sei der Erste!";
pub const LOAD_ERROR_MESSAGE: &str = "Fehler beim Laden der Kommentare.";
pub const REMAINDER_ERROR_LABEL: &str = "Fehler beim Laden";

pub fn load_all_label(total: u64) -> String {
    format!("Alle {} Kommentare anzeigen", total)
}

/// Preference key of this browser's upvote flag for a comment
pub fn upvote_key(comment_id: &str) -> String {
    format!("upvoted_{}", comment_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedState {
    /// Nothing requested yet
    Empty,
    /// Store reported zero comments
    NoComments,
    /// First page shown, more remain behind the cursor
    FirstPageLoaded,
    AllLoaded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub id: DocumentId,
    pub name: String,
    pub comment: String,
    pub age: String,
    pub upvotes: u64,
    pub upvoted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedView {
    pub comments: Vec<CommentView>,
    /// Label of the "load remaining" affordance, when shown
    pub load_more: Option<String>,
    /// Inline empty-state or error text
    pub message: Option<String>,
}

pub struct CommentFeed {
    store: Arc<dyn DocumentStore>,
    preferences: Arc<dyn PreferenceStore>,
    collection: CollectionPath,
    page_size: u32,
    state: FeedState,
    entries: Vec<CommentEntry>,
    total: u64,
    cursor: Option<PageCursor>,
    load_more: Option<String>,
    message: Option<&'static str>,
}

impl CommentFeed {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        preferences: Arc<dyn PreferenceStore>,
        vendor: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            preferences,
            collection: CollectionPath::comments(vendor),
            page_size: page_size.max(1),
            state: FeedState::Empty,
            entries: Vec::new(),
            total: 0,
            cursor: None,
            load_more: None,
            message: None,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn entries(&self) -> &[CommentEntry] {
        &self.entries
    }

    /// Total reported by the store on the last first-page load
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn has_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    fn newest_first() -> DocumentQuery {
        DocumentQuery::ordered_by(TIMESTAMP_FIELD, SortDirection::Descending)
    }

    fn parse_entries(&self, documents: Vec<StoredDocument>) -> Vec<CommentEntry> {
        documents
            .into_iter()
            .filter_map(|document| match CommentEntry::from_document(document) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping comment in {}: {}", self.collection, e);
                    None
                }
            })
            .collect()
    }

    fn fail(&mut self, context: &str, e: AppError) -> AppError {
        error!("{} for {}: {}", context, self.collection, e);
        self.state = FeedState::Error;
        self.message = Some(LOAD_ERROR_MESSAGE);
        e
    }

    /// Load the total count and the newest page. The two requests run
    /// concurrently and are not mutually consistent.
    pub async fn load_first_page(&mut self) -> AppResult<()> {
        self.entries.clear();
        self.cursor = None;
        self.load_more = None;
        self.message = None;
        self.total = 0;
        self.state = FeedState::Empty;

        let query = Self::newest_first().limit(self.page_size);
        let (count, page) = futures::join!(
            self.store.count(&self.collection),
            self.store.query(&self.collection, query)
        );

        let total = count.map_err(|e| self.fail("Failed to count comments", e))?;
        if total == 0 {
            self.state = FeedState::NoComments;
            self.message = Some(EMPTY_MESSAGE);
            return Ok(());
        }

        let page = page.map_err(|e| self.fail("Failed to load comments", e))?;
        let last = page.documents.last().cloned();
        self.total = total;
        self.entries = self.parse_entries(page.documents);

        if total > self.page_size as u64 {
            self.cursor = last.and_then(|doc| PageCursor::at(&doc, TIMESTAMP_FIELD));
        }
        match self.cursor {
            Some(_) => {
                self.state = FeedState::FirstPageLoaded;
                self.load_more = Some(load_all_label(total));
            }
            None => self.state = FeedState::AllLoaded,
        }

        debug!(
            "Loaded {} of {} comments for {}",
            self.entries.len(),
            total,
            self.collection
        );
        Ok(())
    }

    /// Append every comment after the cursor. The cursor is only consumed on
    /// success, so a failed fetch can be retried.
    pub async fn load_remainder(&mut self) -> AppResult<()> {
        let Some(cursor) = self.cursor.clone() else {
            return Ok(());
        };

        let query = Self::newest_first().start_after(cursor);
        let result = self.store.query(&self.collection, query).await;
        match result {
            Ok(page) => {
                let mut rest = self.parse_entries(page.documents);
                self.entries.append(&mut rest);
                self.cursor = None;
                self.load_more = None;
                self.state = FeedState::AllLoaded;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load remaining comments for {}: {}", self.collection, e);
                self.load_more = Some(REMAINDER_ERROR_LABEL.to_string());
                Err(e)
            }
        }
    }

    /// Store a new comment. The feed is not re-rendered; it shows up on the next load.
    pub async fn submit(&self, display_name: Option<&str>, body: &str) -> AppResult<DocumentId> {
        let document = NewComment::new(display_name, body, Utc::now()).into_document()?;
        match self.store.insert(&self.collection, document).await {
            Ok(id) => {
                info!("Comment {} added to {}", id, self.collection);
                Ok(id)
            }
            Err(e) => {
                error!("Failed to add comment to {}: {}", self.collection, e);
                Err(e)
            }
        }
    }

    pub fn is_upvoted(&self, comment_id: &str) -> bool {
        self.preferences.get(&upvote_key(comment_id)).is_some()
    }

    /// Optimistically set this browser's upvote on a rendered comment, then
    /// apply the ±1 to the stored count. A failed increment leaves the local
    /// flag and count as they are.
    pub async fn toggle_upvote(&mut self, comment_id: &str, want_upvoted: bool) -> AppResult<()> {
        if self.is_upvoted(comment_id) == want_upvoted {
            return Ok(());
        }

        let key = upvote_key(comment_id);
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == comment_id)
            .ok_or_else(|| AppError::NotFound(format!("Comment {} is not shown", comment_id)))?;

        if want_upvoted {
            self.preferences.set(&key, "true")?;
        } else {
            self.preferences.remove(&key)?;
        }
        let entry = &mut self.entries[index];
        entry.upvotes = if want_upvoted {
            entry.upvotes + 1
        } else {
            entry.upvotes.saturating_sub(1)
        };

        let delta = if want_upvoted { 1 } else { -1 };
        self.store
            .increment(&self.collection, comment_id, UPVOTES_FIELD, delta)
            .await
            .map_err(|e| {
                error!("Failed to update upvotes of {}: {}", comment_id, e);
                e
            })
    }

    pub fn render(&self, now: DateTime<Utc>) -> FeedView {
        FeedView {
            comments: self
                .entries
                .iter()
                .map(|entry| CommentView {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    comment: entry.comment.clone(),
                    age: format_relative(entry.timestamp, now),
                    upvotes: entry.upvotes,
                    upvoted: self.is_upvoted(&entry.id),
                })
                .collect(),
            load_more: self.load_more.clone(),
            message: self.message.map(str::to_string),
        }
    }
}
