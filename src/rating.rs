use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::AppResult;
use crate::identity::AnonymousUser;
use crate::infrastructure::document_store::{CollectionPath, DocumentStore, StoredDocument};
use crate::models::{validate_rating, RatingEntry};

/// Average over every valid rating plus the viewer's own entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: usize,
    pub own_rating: Option<f64>,
}

impl RatingSummary {
    /// Malformed documents are ignored; one document per user means one vote per user.
    pub fn from_documents(documents: &[StoredDocument], user: Option<&AnonymousUser>) -> Self {
        let entries: Vec<RatingEntry> = documents.iter().filter_map(RatingEntry::from_document).collect();
        let average = (!entries.is_empty())
            .then(|| entries.iter().map(|e| e.rating).sum::<f64>() / entries.len() as f64);
        let own_rating = user.and_then(|user| {
            entries
                .iter()
                .find(|entry| entry.user_id == user.as_str())
                .map(|entry| entry.rating)
        });

        Self {
            average,
            count: entries.len(),
            own_rating,
        }
    }

    /// Average rounded to one decimal, or a dash with no ratings
    pub fn display_average(&self) -> String {
        match self.average {
            Some(average) => format!("{:.1}", (average * 10.0).round() / 10.0),
            None => "-".to_string(),
        }
    }

    /// Pre-filled value of the rating input; empty when the viewer has not rated
    pub fn input_value(&self) -> String {
        self.own_rating.map(|r| r.to_string()).unwrap_or_default()
    }
}

pub struct RatingPanel {
    store: Arc<dyn DocumentStore>,
    collection: CollectionPath,
    user: AnonymousUser,
}

impl RatingPanel {
    pub fn new(store: Arc<dyn DocumentStore>, vendor: impl Into<String>, user: AnonymousUser) -> Self {
        Self {
            store,
            collection: CollectionPath::ratings(vendor),
            user,
        }
    }

    pub fn user(&self) -> &AnonymousUser {
        &self.user
    }

    pub async fn load_and_average(&self) -> AppResult<RatingSummary> {
        let documents = self.store.get_all(&self.collection).await.map_err(|e| {
            error!("Failed to load ratings for {}: {}", self.collection, e);
            e
        })?;
        Ok(RatingSummary::from_documents(&documents, Some(&self.user)))
    }

    /// Create or overwrite this user's rating; repeated submissions replace the value
    pub async fn submit(&self, value: f64) -> AppResult<()> {
        let rating = validate_rating(value)?;
        let document = RatingEntry::document(rating, Utc::now());
        self.store
            .upsert(&self.collection, self.user.as_str(), document)
            .await
            .map_err(|e| {
                error!("Failed to save rating for {}: {}", self.collection, e);
                e
            })?;
        info!("User {} rated {} with {}", self.user, self.collection.vendor, rating);
        Ok(())
    }
}
