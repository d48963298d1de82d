// Döner ranking - vendor table, comment feed and anonymous ratings

// HTTP routes and handlers
pub mod api;
pub mod app_state;
pub mod config;

// Document store, preferences and id generation
pub mod infrastructure;

// Vendor, comment and rating records
pub mod models;

// Page controllers
pub mod feed;
pub mod identity;
pub mod ranking;
pub mod rating;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
