// Storage infrastructure
pub mod document_store;        // Document store interface and cursor types
pub mod id_generator;          // Time-ordered document ids
pub mod memory_store;          // In-process document store
pub mod sqlite_store;          // SQLite-backed document store
pub mod preferences;           // Per-browser key/value preferences

pub use document_store::{
    CollectionPath, Document, DocumentId, DocumentQuery, DocumentStore, PageCursor, QueryPage,
    StoredDocument, SubCollection,
};
pub use id_generator::DocumentIdGenerator;
pub use memory_store::MemoryDocumentStore;
pub use preferences::{FilePreferences, MemoryPreferences, PreferenceStore};
pub use sqlite_store::SqliteDocumentStore;
