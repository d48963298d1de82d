// Document Store Interface - the remote data source behind comments and ratings
// Vendor-keyed parents own two sub-collections: comments (auto ids) and ratings (user ids)

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{AppError, AppResult};
use crate::models::SortDirection;

/// A stored document body
pub type Document = Map<String, Value>;

/// Opaque document identifier, assigned by the store or chosen by the caller
pub type DocumentId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubCollection {
    Comments,
    Ratings,
}

impl SubCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubCollection::Comments => "comments",
            SubCollection::Ratings => "ratings",
        }
    }
}

/// Address of a sub-collection: `vendors/{vendor}/{kind}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionPath {
    pub vendor: String,
    pub kind: SubCollection,
}

impl CollectionPath {
    pub fn comments(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            kind: SubCollection::Comments,
        }
    }

    pub fn ratings(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            kind: SubCollection::Ratings,
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vendors/{}/{}", self.vendor, self.kind.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub data: Document,
}

impl StoredDocument {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name).filter(|v| !v.is_null())
    }
}

/// Continuation marker: ordering value and id of the last document seen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCursor {
    pub value: Value,
    pub id: DocumentId,
}

impl PageCursor {
    /// Cursor positioned at `document`, or None when it lacks the ordering field
    pub fn at(document: &StoredDocument, order_by: &str) -> Option<Self> {
        document.field(order_by).map(|value| Self {
            value: value.clone(),
            id: document.id.clone(),
        })
    }

    /// Opaque token form used across HTTP
    pub fn encode(&self) -> AppResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(token: &str) -> AppResult<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| AppError::BadRequest(format!("Invalid cursor: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BadRequest(format!("Invalid cursor: {}", e)))
    }
}

/// Ordered query over one sub-collection.
///
/// Documents without the ordering field are excluded. Ties on the ordering
/// value are broken by document id in the same direction.
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub order_by: String,
    pub direction: SortDirection,
    pub limit: Option<u32>,
    pub start_after: Option<PageCursor>,
}

impl DocumentQuery {
    pub fn ordered_by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            order_by: field.into(),
            direction,
            limit: None,
            start_after: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: PageCursor) -> Self {
        self.start_after = Some(cursor);
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        validate_field_name(&self.order_by)?;
        if self.limit == Some(0) {
            return Err(AppError::Validation("Query limit must be positive".to_string()));
        }
        Ok(())
    }
}

/// One page of query results with pagination
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub documents: Vec<StoredDocument>,
    /// Set when the page was filled up to its limit, so more may follow
    pub next_cursor: Option<PageCursor>,
}

impl QueryPage {
    pub fn new(documents: Vec<StoredDocument>, query: &DocumentQuery) -> Self {
        let next_cursor = match query.limit {
            Some(limit) if documents.len() as u64 >= limit as u64 => documents
                .last()
                .and_then(|doc| PageCursor::at(doc, &query.order_by)),
            _ => None,
        };
        Self {
            documents,
            next_cursor,
        }
    }
}

/// Remote data source operations consumed by the controllers
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a fresh store-assigned id
    async fn insert(&self, collection: &CollectionPath, data: Document) -> AppResult<DocumentId>;

    /// Ordered, optionally limited and cursor-continued query
    async fn query(&self, collection: &CollectionPath, query: DocumentQuery)
        -> AppResult<QueryPage>;

    /// Exact number of documents in the collection
    async fn count(&self, collection: &CollectionPath) -> AppResult<u64>;

    /// Every document, in creation order
    async fn get_all(&self, collection: &CollectionPath) -> AppResult<Vec<StoredDocument>>;

    /// Create the document under `id`, or merge `data` into the existing one
    async fn upsert(&self, collection: &CollectionPath, id: &str, data: Document)
        -> AppResult<()>;

    /// Atomically add `delta` to a numeric field; a missing field counts as zero
    async fn increment(
        &self,
        collection: &CollectionPath,
        id: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<()>;
}

pub fn validate_field_name(field: &str) -> AppResult<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid field name: {:?}", field)))
    }
}

/// Ordering between two field values: booleans, then numbers, then strings
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or(0.0)
                .total_cmp(&y.as_f64().unwrap_or(0.0)),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// RFC 7396 merge of `patch` into `target`
pub fn merge_document(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(inner) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => merge_document(existing, inner),
                _ => {
                    let mut fresh = Document::new();
                    merge_document(&mut fresh, inner);
                    target.insert(key, Value::Object(fresh));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}
