use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{Document, StoredDocument};

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

/// One user's rating of a vendor; the document id is the user id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingEntry {
    pub user_id: String,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl RatingEntry {
    /// None for entries whose rating is missing or not a finite number
    pub fn from_document(document: &StoredDocument) -> Option<Self> {
        let rating = document
            .field("rating")
            .and_then(Value::as_f64)
            .filter(|r| r.is_finite())?;

        Some(Self {
            user_id: document.id.clone(),
            rating,
            timestamp: document.field("timestamp").and_then(Value::as_i64),
        })
    }

    pub fn document(rating: f64, timestamp: DateTime<Utc>) -> Document {
        let mut data = Document::new();
        data.insert("rating".to_string(), json!(rating));
        data.insert("timestamp".to_string(), json!(timestamp.timestamp_millis()));
        data
    }
}

pub fn validate_rating(value: f64) -> AppResult<f64> {
    if !value.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(AppError::Validation(format!(
            "Rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, value
        )));
    }
    Ok(value)
}
