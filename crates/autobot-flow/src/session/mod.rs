//! Session store.
//!
//! The browser profile directory is the persistent session. Inside it,
//! `storage.json` holds an exported copy of the authentication state. It is
//! written after a verified login and deleted when a resumed session turns
//! out to be stale.

mod archive;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use autobot_browser::StorageState;
use autobot_config::BotConfig;
use tracing::{debug, info, warn};

use crate::error::FlowError;

pub use archive::RestoreOutcome;

/// Persistence of the serialized authentication artifact.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Delete the artifact. Deleting an absent artifact succeeds.
    async fn invalidate(&self) -> Result<(), FlowError>;

    /// Replace the artifact with `state`.
    async fn persist(&self, state: &StorageState) -> Result<(), FlowError>;

    /// Read the artifact. A missing or unreadable one yields `None`.
    async fn load(&self) -> Result<Option<StorageState>, FlowError>;
}

/// Session store rooted at a Chrome profile directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profile_dir: PathBuf,
    archive: PathBuf,
    storage_file: String,
}

impl ProfileStore {
    pub fn new(
        profile_dir: impl Into<PathBuf>,
        archive: impl Into<PathBuf>,
        storage_file: impl Into<String>,
    ) -> Self {
        Self {
            profile_dir: profile_dir.into(),
            archive: archive.into(),
            storage_file: storage_file.into(),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(
            config.profile_dir(),
            config.profile.archive.clone(),
            config.profile.storage_file.clone(),
        )
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    pub fn storage_path(&self) -> PathBuf {
        self.profile_dir.join(&self.storage_file)
    }

    /// A profile is usable when its directory exists and is not empty.
    pub fn has_valid_profile(&self) -> bool {
        std::fs::read_dir(&self.profile_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// Unpack the bundled archive when no usable profile exists yet.
    ///
    /// Never fails: extraction problems are logged and reported in the
    /// outcome, and the bot continues with whatever profile it has.
    pub fn restore_from_archive(&self) -> RestoreOutcome {
        if !self.archive.is_file() {
            debug!("No bundled profile archive at {}", self.archive.display());
            return RestoreOutcome::NoArchive;
        }

        if self.has_valid_profile() {
            info!(
                "Existing login profile at {}, skipping archive",
                self.profile_dir.display()
            );
            return RestoreOutcome::AlreadyPresent;
        }

        info!(
            "Extracting saved login from {}...",
            self.archive.display()
        );
        match archive::extract_into(&self.archive, &self.profile_dir) {
            Ok(entries) => {
                info!("Login profile extracted ({} entries)", entries);
                RestoreOutcome::Restored { entries }
            }
            Err(e) => {
                warn!("Failed to extract {}: {}", self.archive.display(), e);
                RestoreOutcome::Failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl SessionStore for ProfileStore {
    async fn invalidate(&self) -> Result<(), FlowError> {
        let path = self.storage_path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed stale session artifact {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, state: &StorageState) -> Result<(), FlowError> {
        tokio::fs::create_dir_all(&self.profile_dir).await?;

        let path = self.storage_path();
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(state)?;

        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!(
            "Session saved to {} ({} cookies)",
            path.display(),
            state.cookies.len()
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<StorageState>, FlowError> {
        let path = self.storage_path();
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<StorageState>(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Ignoring unreadable session artifact {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
