//! Ranking table engine.
//!
//! Loads the vendor snapshot once and keeps a filtered, sorted working list
//! over it. The full list is never mutated; filtering rebuilds the working
//! list from snapshot order and re-applies the active sort, so ties keep
//! snapshot order.

pub mod sort;

pub use sort::{compare_records, SortState};

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::models::{SortDirection, SortKey, VendorRecord};

/// Shown in place of the table when the snapshot cannot be loaded
pub const LOAD_ERROR_MESSAGE: &str = "Daten konnten nicht geladen werden.";

/// Where the vendor snapshot comes from
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> AppResult<String>;
}

/// Snapshot read from a JSON file on disk
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshot {
    async fn fetch(&self) -> AppResult<String> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Transport(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingCell {
    pub key: SortKey,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    /// 1-based position in the rendered output
    pub rank: usize,
    pub name: String,
    pub cells: Vec<RankingCell>,
}

#[derive(Debug, Clone)]
pub struct RankingTable {
    records: Vec<VendorRecord>,
    working: Vec<usize>,
    filter: String,
    sort: SortState,
}

impl RankingTable {
    /// Fetch and parse the snapshot. Transport and parse failures both mean
    /// the table shows `LOAD_ERROR_MESSAGE` and nothing else.
    pub async fn load(source: &dyn SnapshotSource) -> AppResult<Self> {
        let payload = source.fetch().await.map_err(|e| {
            error!("Failed to load vendor snapshot: {}", e);
            e
        })?;
        let records = Self::parse(&payload).map_err(|e| {
            error!("Failed to parse vendor snapshot: {}", e);
            e
        })?;
        info!("Loaded {} vendors", records.len());
        Ok(Self::from_records(records))
    }

    pub fn parse(payload: &str) -> AppResult<Vec<VendorRecord>> {
        serde_json::from_str(payload)
            .map_err(|e| AppError::Parse(format!("Vendor snapshot is malformed: {}", e)))
    }

    pub fn from_records(records: Vec<VendorRecord>) -> Self {
        let mut table = Self {
            working: (0..records.len()).collect(),
            records,
            filter: String::new(),
            sort: SortState::default(),
        };
        table.sort_working();
        table
    }

    /// Keep only vendors whose name contains `text`, case-insensitively
    pub fn apply_filter(&mut self, text: &str) {
        self.filter = text.to_lowercase();
        let needle = &self.filter;
        self.working = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.name.to_lowercase().contains(needle.as_str()))
            .map(|(index, _)| index)
            .collect();
        self.sort_working();
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort.select(key);
        self.sort_working();
    }

    /// Replace the sort state outright
    pub fn sort_by(&mut self, state: SortState) {
        self.sort = state;
        self.sort_working();
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Arrow to show on a column header
    pub fn sort_indicator(&self, key: SortKey) -> Option<SortDirection> {
        (self.sort.key == key).then_some(self.sort.direction)
    }

    pub fn records(&self) -> &[VendorRecord] {
        &self.records
    }

    pub fn vendor(&self, name: &str) -> Option<&VendorRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// Working list in current order
    pub fn visible(&self) -> impl Iterator<Item = &VendorRecord> + '_ {
        self.working.iter().map(move |&index| &self.records[index])
    }

    pub fn render(&self) -> Vec<RankingRow> {
        self.visible()
            .enumerate()
            .map(|(position, record)| RankingRow {
                rank: position + 1,
                name: record.name.clone(),
                cells: SortKey::ALL
                    .iter()
                    .map(|&key| RankingCell {
                        key,
                        text: record.display(key),
                    })
                    .collect(),
            })
            .collect()
    }

    fn sort_working(&mut self) {
        let records = &self.records;
        let state = self.sort;
        // sort_by is stable: equal keys keep their previous relative order
        self.working
            .sort_by(|&a, &b| compare_records(&records[a], &records[b], state));
    }
}
