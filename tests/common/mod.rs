#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

use doener_ranking::{
    error::{AppError, AppResult},
    infrastructure::{
        CollectionPath, Document, DocumentId, DocumentQuery, DocumentStore, MemoryDocumentStore,
        QueryPage, StoredDocument,
    },
    models::NewComment,
};

pub const VENDOR: &str = "Imbiss Alpha";

/// Memory store whose operations can be switched to fail with a transport error
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryDocumentStore,
    pub fail_query: AtomicBool,
    pub fail_count: AtomicBool,
    pub fail_increment: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(flag: &AtomicBool, operation: &str) -> AppResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(AppError::Transport(format!("{} unavailable", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn insert(&self, collection: &CollectionPath, data: Document) -> AppResult<DocumentId> {
        self.inner.insert(collection, data).await
    }

    async fn query(&self, collection: &CollectionPath, query: DocumentQuery) -> AppResult<QueryPage> {
        Self::check(&self.fail_query, "query")?;
        self.inner.query(collection, query).await
    }

    async fn count(&self, collection: &CollectionPath) -> AppResult<u64> {
        Self::check(&self.fail_count, "count")?;
        self.inner.count(collection).await
    }

    async fn get_all(&self, collection: &CollectionPath) -> AppResult<Vec<StoredDocument>> {
        self.inner.get_all(collection).await
    }

    async fn upsert(&self, collection: &CollectionPath, id: &str, data: Document) -> AppResult<()> {
        self.inner.upsert(collection, id, data).await
    }

    async fn increment(
        &self,
        collection: &CollectionPath,
        id: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<()> {
        Self::check(&self.fail_increment, "increment")?;
        self.inner.increment(collection, id, field, delta).await
    }
}

pub fn base_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Insert `n` comments one minute apart, oldest first; returns their ids in insertion order
pub async fn seed_comments(store: &dyn DocumentStore, vendor: &str, n: usize) -> Vec<DocumentId> {
    let collection = CollectionPath::comments(vendor);
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let comment = NewComment::new(
            Some(&format!("Gast {}", i)),
            format!("Kommentar {}", i),
            base_time() + Duration::minutes(i as i64),
        );
        ids.push(store.insert(&collection, comment.into_document().unwrap()).await.unwrap());
    }
    ids
}

pub const SNAPSHOT: &str = r#"[
    {"name": "Imbiss Alpha", "preis": 6, "geschmack": 8, "gesamt": 8.2, "kommentar": "Solide"},
    {"name": "Beta Grill", "preis": "-", "geschmack": null, "gesamt": null},
    {"name": "Gamma Kebap", "preis": 7, "geschmack": 9, "gesamt": 9.1},
    {"name": "alpha döner", "preis": 5.5, "gesamt": 7.4}
]"#;
