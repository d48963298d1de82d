// Local Preference Store - per-browser key/value persistence
// Holds the anonymous user id and one upvote flag per comment

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Internal("Preference lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok().and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.values
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.values.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

/// Preferences persisted as one JSON object file, rewritten on every change
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FilePreferences {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                AppError::Parse(format!("Preferences file {} is malformed: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    fn persist(&self, values: &HashMap<String, String>) -> AppResult<()> {
        let body = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, body).map_err(|e| {
            warn!("Failed to write preferences to {}: {}", self.path.display(), e);
            AppError::from(e)
        })
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok().and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self.values.write().map_err(poisoned)?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut values = self.values.write().map_err(poisoned)?;
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}
