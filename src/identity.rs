use std::fmt;
use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;
use crate::infrastructure::preferences::PreferenceStore;

/// Preference key holding the anonymous user id
pub const USER_ID_KEY: &str = "anonUserId";

/// Durable per-browser pseudo-identity; keys the user's rating documents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousUser(String);

impl AnonymousUser {
    /// Reuse the stored id, or mint and persist a new one
    pub fn load_or_create(preferences: &dyn PreferenceStore) -> AppResult<Self> {
        if let Some(id) = preferences.get(USER_ID_KEY).filter(|id| !id.trim().is_empty()) {
            return Ok(Self(id));
        }

        let id = Uuid::new_v4().to_string();
        preferences.set(USER_ID_KEY, &id)?;
        info!("Created anonymous user {}", id);
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AnonymousUser {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AnonymousUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
