use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{FieldValue, SortDirection, SortKey, VendorRecord};

/// The single active sort column and its direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Overall,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    /// Direction a column starts in: names read A-Z, scores highest first
    pub fn initial_direction(key: SortKey) -> SortDirection {
        if key == SortKey::Name {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    pub fn for_key(key: SortKey) -> Self {
        Self {
            key,
            direction: Self::initial_direction(key),
        }
    }

    /// Header click: same column flips, a new column starts in its initial direction
    pub fn select(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.toggled();
        } else {
            *self = Self::for_key(key);
        }
    }
}

fn sort_text(value: FieldValue<'_>) -> String {
    match value {
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Text(s) => s.to_lowercase(),
        FieldValue::Absent => String::new(),
    }
}

/// Absent values sink to the bottom in both directions; only present pairs are oriented.
pub fn compare_records(a: &VendorRecord, b: &VendorRecord, state: SortState) -> Ordering {
    match (a.value(state.key), b.value(state.key)) {
        (FieldValue::Absent, FieldValue::Absent) => Ordering::Equal,
        (FieldValue::Absent, _) => Ordering::Greater,
        (_, FieldValue::Absent) => Ordering::Less,
        (FieldValue::Number(x), FieldValue::Number(y)) => state.direction.apply(x.total_cmp(&y)),
        (x, y) => state.direction.apply(sort_text(x).cmp(&sort_text(y))),
    }
}
