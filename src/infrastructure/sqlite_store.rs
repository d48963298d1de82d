use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row};
use std::str::FromStr;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{
    validate_field_name, CollectionPath, Document, DocumentId, DocumentQuery, DocumentStore,
    QueryPage, StoredDocument,
};
use crate::infrastructure::id_generator::DocumentIdGenerator;
use crate::models::SortDirection;

/// SQLite-backed document store. Documents live as JSON text in a single table.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    ids: DocumentIdGenerator,
}

impl SqliteDocumentStore {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid database URL {}: {}", url, e))
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        let store = Self {
            pool,
            ids: DocumentIdGenerator::default(),
        };
        store.initialize().await?;
        info!("Document store ready at {}", url);
        Ok(store)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            AppError::ConfigurationError(format!("Invalid in-memory SQLite options: {}", e))
        })?;

        // A single pinned connection; every new :memory: connection is a new database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let store = Self {
            pool,
            ids: DocumentIdGenerator::default(),
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Create the documents table and its index
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                vendor TEXT NOT NULL,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                time_created INTEGER NOT NULL,
                time_updated INTEGER NOT NULL,
                PRIMARY KEY (vendor, collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create documents table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(vendor, collection, time_created)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to create documents index: {}", e))
        })?;

        Ok(())
    }

    /// Health check to verify database connectivity
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    async fn exists(&self, collection: &CollectionPath, id: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM documents WHERE vendor = ? AND collection = ? AND id = ?")
            .bind(&collection.vendor)
            .bind(collection.kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to check {}/{}: {}", collection, id, e))
            })?;
        Ok(row.is_some())
    }
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

fn push_json_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) -> AppResult<()> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else {
                qb.push_bind(n.as_f64().unwrap_or(0.0));
            }
        }
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        Value::Bool(b) => {
            qb.push_bind(*b);
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "Cursor value {} cannot be used for ordering",
                other
            )))
        }
    }
    Ok(())
}

fn row_to_document(row: SqliteRow) -> AppResult<StoredDocument> {
    let id: String = row.get("id");
    let raw: String = row.get("data");
    let data: Document = serde_json::from_str(&raw)
        .map_err(|e| AppError::Parse(format!("Stored document {} is not a JSON object: {}", id, e)))?;
    Ok(StoredDocument { id, data })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    #[instrument(skip(self, data))]
    async fn insert(&self, collection: &CollectionPath, data: Document) -> AppResult<DocumentId> {
        let id = self.ids.next_id();
        let now = chrono::Utc::now().timestamp_millis();
        let body = serde_json::to_string(&data)?;

        sqlx::query(
            "INSERT INTO documents (vendor, collection, id, data, time_created, time_updated) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&collection.vendor)
        .bind(collection.kind.as_str())
        .bind(&id)
        .bind(body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to insert into {}: {}", collection, e))
        })?;

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn query(
        &self,
        collection: &CollectionPath,
        query: DocumentQuery,
    ) -> AppResult<QueryPage> {
        query.validate()?;
        let path = json_path(&query.order_by);
        let (cmp, dir) = match query.direction {
            SortDirection::Ascending => (" > ", " ASC"),
            SortDirection::Descending => (" < ", " DESC"),
        };

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, data FROM documents WHERE vendor = ");
        qb.push_bind(collection.vendor.clone());
        qb.push(" AND collection = ");
        qb.push_bind(collection.kind.as_str());
        qb.push(" AND json_extract(data, ");
        qb.push_bind(path.clone());
        qb.push(") IS NOT NULL");

        if let Some(cursor) = &query.start_after {
            qb.push(" AND (json_extract(data, ");
            qb.push_bind(path.clone());
            qb.push(")");
            qb.push(cmp);
            push_json_value(&mut qb, &cursor.value)?;
            qb.push(" OR (json_extract(data, ");
            qb.push_bind(path.clone());
            qb.push(") = ");
            push_json_value(&mut qb, &cursor.value)?;
            qb.push(" AND id");
            qb.push(cmp);
            qb.push_bind(cursor.id.clone());
            qb.push("))");
        }

        qb.push(" ORDER BY json_extract(data, ");
        qb.push_bind(path);
        qb.push(")");
        qb.push(dir);
        qb.push(", id");
        qb.push(dir);

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to query {}: {}", collection, e)))?;

        let documents = rows
            .into_iter()
            .map(row_to_document)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(QueryPage::new(documents, &query))
    }

    async fn count(&self, collection: &CollectionPath) -> AppResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM documents WHERE vendor = ? AND collection = ?",
        )
        .bind(&collection.vendor)
        .bind(collection.kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to count {}: {}", collection, e)))?;

        Ok(row.get::<i64, _>("count") as u64)
    }

    async fn get_all(&self, collection: &CollectionPath) -> AppResult<Vec<StoredDocument>> {
        let rows = sqlx::query(
            "SELECT id, data FROM documents WHERE vendor = ? AND collection = ? ORDER BY time_created, id",
        )
        .bind(&collection.vendor)
        .bind(collection.kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read {}: {}", collection, e)))?;

        rows.into_iter().map(row_to_document).collect()
    }

    #[instrument(skip(self, data))]
    async fn upsert(&self, collection: &CollectionPath, id: &str, data: Document) -> AppResult<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let patch = serde_json::to_string(&data)?;

        sqlx::query(
            r#"
            INSERT INTO documents (vendor, collection, id, data, time_created, time_updated)
            VALUES (?, ?, ?, json_patch('{}', ?), ?, ?)
            ON CONFLICT(vendor, collection, id)
            DO UPDATE SET data = json_patch(documents.data, ?), time_updated = excluded.time_updated
            "#,
        )
        .bind(&collection.vendor)
        .bind(collection.kind.as_str())
        .bind(id)
        .bind(&patch)
        .bind(now)
        .bind(now)
        .bind(&patch)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to upsert {}/{}: {}", collection, id, e))
        })?;

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
        let path = json_path(field);
        let now = chrono::Utc::now().timestamp_millis();

        // Single statement so concurrent increments never lose updates
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = json_set(data, ?, COALESCE(json_extract(data, ?), 0) + ?),
                time_updated = ?
            WHERE vendor = ? AND collection = ? AND id = ?
              AND COALESCE(json_type(data, ?), 'null') IN ('integer', 'null')
            "#,
        )
        .bind(&path)
        .bind(&path)
        .bind(delta)
        .bind(now)
        .bind(&collection.vendor)
        .bind(collection.kind.as_str())
        .bind(id)
        .bind(&path)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to increment {}/{}: {}", collection, id, e))
        })?;

        if result.rows_affected() == 0 {
            if self.exists(collection, id).await? {
                return Err(AppError::Validation(format!(
                    "Field {} of {} is not an integer",
                    field, id
                )));
            }
            return Err(AppError::NotFound(format!(
                "Document {}/{} not found",
                collection, id
            )));
        }
        Ok(())
    }
}
