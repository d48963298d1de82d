use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{Document, DocumentId, StoredDocument};

/// Display name used when a commenter leaves the name field empty
pub const ANONYMOUS_NAME: &str = "Anonym";

/// Field the feed orders comments by
pub const TIMESTAMP_FIELD: &str = "timestamp";
/// Field holding the stored upvote count
pub const UPVOTES_FIELD: &str = "upvotes";

/// A comment as stored in `vendors/{vendor}/comments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentEntry {
    pub id: DocumentId,
    pub name: String,
    pub comment: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub upvotes: u64,
}

#[derive(Deserialize)]
struct CommentDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    comment: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    upvotes: i64,
}

impl CommentEntry {
    pub fn from_document(document: StoredDocument) -> AppResult<Self> {
        let raw: CommentDocument = serde_json::from_value(Value::Object(document.data))
            .map_err(|e| AppError::Parse(format!("Comment {} is malformed: {}", document.id, e)))?;

        Ok(Self {
            id: document.id,
            name: display_name(raw.name.as_deref()),
            comment: raw.comment,
            timestamp: raw.timestamp,
            upvotes: raw.upvotes.max(0) as u64,
        })
    }
}

/// Body of a freshly submitted comment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComment {
    pub name: String,
    pub comment: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub upvotes: u64,
}

impl NewComment {
    pub fn new(name: Option<&str>, comment: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: display_name(name),
            comment: comment.into(),
            timestamp,
            upvotes: 0,
        }
    }

    pub fn into_document(self) -> AppResult<Document> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::Internal(format!(
                "Comment serialized to non-object {}",
                other
            ))),
        }
    }
}

fn display_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => ANONYMOUS_NAME.to_string(),
    }
}
