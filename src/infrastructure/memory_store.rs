use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{
    compare_values, merge_document, validate_field_name, CollectionPath, Document, DocumentId,
    DocumentQuery, DocumentStore, PageCursor, QueryPage, StoredDocument,
};
use crate::infrastructure::id_generator::DocumentIdGenerator;
use crate::models::SortDirection;

/// In-process document store; collections keep insertion order
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<CollectionPath, Vec<StoredDocument>>>>,
    ids: DocumentIdGenerator,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ordering_key<'a>(document: &'a StoredDocument, field: &str) -> Option<&'a Value> {
    document.field(field)
}

fn position(value: &Value, id: &str, cursor: &PageCursor) -> Ordering {
    compare_values(value, &cursor.value).then_with(|| id.cmp(cursor.id.as_str()))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    #[instrument(skip(self, data))]
    async fn insert(&self, collection: &CollectionPath, data: Document) -> AppResult<DocumentId> {
        let id = self.ids.next_id();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.clone())
            .or_default()
            .push(StoredDocument {
                id: id.clone(),
                data,
            });
        debug!("Inserted {} into {}", id, collection);
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn query(
        &self,
        collection: &CollectionPath,
        query: DocumentQuery,
    ) -> AppResult<QueryPage> {
        query.validate()?;
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(QueryPage::default());
        };

        let mut matching: Vec<&StoredDocument> = documents
            .iter()
            .filter(|doc| ordering_key(doc, &query.order_by).is_some())
            .collect();

        matching.sort_by(|a, b| {
            let ord = match (
                ordering_key(a, &query.order_by),
                ordering_key(b, &query.order_by),
            ) {
                (Some(x), Some(y)) => compare_values(x, y),
                _ => Ordering::Equal,
            };
            query.direction.apply(ord.then_with(|| a.id.cmp(&b.id)))
        });

        let page: Vec<StoredDocument> = matching
            .into_iter()
            .filter(|doc| match (&query.start_after, ordering_key(doc, &query.order_by)) {
                (Some(cursor), Some(value)) => {
                    let ord = position(value, &doc.id, cursor);
                    match query.direction {
                        SortDirection::Ascending => ord == Ordering::Greater,
                        SortDirection::Descending => ord == Ordering::Less,
                    }
                }
                _ => true,
            })
            .take(query.limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(QueryPage::new(page, &query))
    }

    async fn count(&self, collection: &CollectionPath) -> AppResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, |docs| docs.len() as u64))
    }

    async fn get_all(&self, collection: &CollectionPath) -> AppResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    #[instrument(skip(self, data))]
    async fn upsert(&self, collection: &CollectionPath, id: &str, data: Document) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.clone()).or_default();
        match documents.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => merge_document(&mut existing.data, data),
            None => {
                let mut fresh = Document::new();
                merge_document(&mut fresh, data);
                documents.push(StoredDocument {
                    id: id.to_string(),
                    data: fresh,
                });
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn increment(
        &self,
        collection: &CollectionPath,
        id: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<()> {
        validate_field_name(field)?;
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| AppError::NotFound(format!("Document {}/{} not found", collection, id)))?;

        let current = match document.data.get(field) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                AppError::Validation(format!("Field {} of {} is not an integer", field, id))
            })?,
        };
        document
            .data
            .insert(field.to_string(), Value::from(current + delta));
        Ok(())
    }
}
