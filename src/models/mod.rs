// Domain records: vendors from the static snapshot, comments and ratings from the document store

pub mod comment;
pub mod rating;
pub mod vendor;

pub use comment::{CommentEntry, NewComment, ANONYMOUS_NAME};
pub use rating::{validate_rating, RatingEntry, MAX_RATING, MIN_RATING};
pub use vendor::{FieldValue, ScoreValue, SortKey, VendorRecord};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Orient an ascending comparison result
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(crate::error::AppError::Validation(format!(
                "Unknown sort direction: {}",
                s
            ))),
        }
    }
}
