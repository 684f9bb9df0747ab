//! Serialized authentication state.
//!
//! Same layout as Playwright's `storageState` file so a state captured by
//! either tool can be loaded by the other.

use serde::{Deserialize, Serialize};

use crate::cdp::Cookie;

/// Cookies plus per-origin local storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub origins: Vec<OriginStorage>,
}

/// Local storage of one origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginStorage {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<LocalStorageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalStorageEntry {
    pub name: String,
    pub value: String,
}

impl StorageState {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.iter().all(|o| o.local_storage.is_empty())
    }

    /// Drop cookies that expired before `now` (seconds since epoch).
    pub fn without_expired(mut self, now: f64) -> Self {
        self.cookies.retain(|c| c.is_session() || c.expires > now);
        self
    }
}
