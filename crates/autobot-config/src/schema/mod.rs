//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod schema_browser;
mod schema_login;

pub use schema_browser::*;
pub use schema_login::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub profile: ProfileConfig,

    #[serde(default)]
    pub login: LoginConfig,

    #[serde(default)]
    pub inbox: InboxSelectors,

    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BotConfig {
    /// Whether the bot runs on the hosting platform rather than a workstation.
    pub fn hosted(&self) -> bool {
        self.environment.hosted
    }

    /// Directory holding downloaded browser builds.
    pub fn browser_cache_dir(&self) -> PathBuf {
        self.browser.resolved_cache_dir(self.hosted())
    }

    /// Chrome user-data directory backing the persistent context.
    pub fn profile_dir(&self) -> PathBuf {
        self.profile.resolved_dir(self.hosted())
    }

    /// Path of the serialized authentication artifact.
    pub fn storage_state_path(&self) -> PathBuf {
        self.profile_dir().join(&self.profile.storage_file)
    }

    pub fn headless(&self) -> bool {
        self.browser.headless
    }

    /// Chrome's sandbox needs setuid helpers and /dev/shm, which the hosting
    /// platform does not provide.
    pub fn sandbox_enabled(&self) -> bool {
        self.browser.sandbox.unwrap_or(!self.hosted())
    }

    /// Resolve the interactive-login switch against the terminal state.
    pub fn interactive_fallback(&self, stdin_is_terminal: bool) -> bool {
        self.login
            .interactive_fallback
            .unwrap_or(!self.hosted() && stdin_is_terminal)
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Set from `RENDER=true`.
    #[serde(default)]
    pub hosted: bool,
}

/// Health server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files.
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_log_prefix")]
    pub file_prefix: String,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    /// Keep this many daily log files.
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file_prefix: default_log_prefix(),
            json: false,
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_prefix() -> String {
    "wati-autobot".to_string()
}

fn default_max_log_files() -> usize {
    7
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
