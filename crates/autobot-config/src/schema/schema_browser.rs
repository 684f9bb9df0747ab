//! Browser and profile configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::default_true;

const HOSTED_CACHE_DIR: &str = "/tmp/playwright-browsers";
const LOCAL_CACHE_DIR: &str = "playwright_browsers";
const HOSTED_PROFILE_DIR: &str = "/opt/render/project/src/wati_profile";
const LOCAL_PROFILE_DIR: &str = "wati_profile";

/// Browser binary and launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Browser cache directory. Defaults depend on the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Explicit Chrome executable; skips the cache lookup and installer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    /// Chromium build revision expected under the cache directory.
    #[serde(default = "default_revision")]
    pub chromium_revision: String,

    /// Command that downloads Chromium into the cache directory.
    #[serde(default = "default_installer")]
    pub installer: Vec<String>,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Chrome sandboxing. Defaults to off when hosted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<bool>,

    /// Remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// How long to wait for the debugging endpoint after spawning Chrome.
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            executable: None,
            chromium_revision: default_revision(),
            installer: default_installer(),
            headless: true,
            sandbox: None,
            debug_port: default_debug_port(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            startup_timeout_ms: default_startup_timeout_ms(),
        }
    }
}

impl BrowserConfig {
    pub fn resolved_cache_dir(&self, hosted: bool) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.clone(),
            None if hosted => PathBuf::from(HOSTED_CACHE_DIR),
            None => PathBuf::from(LOCAL_CACHE_DIR),
        }
    }
}

fn default_revision() -> String {
    "1117".to_string()
}

fn default_installer() -> Vec<String> {
    ["npx", "--yes", "playwright@1.43.0", "install", "chromium"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_debug_port() -> u16 {
    9222
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_startup_timeout_ms() -> u64 {
    15_000
}

/// Persistent profile configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profile directory. Defaults depend on the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Bundled pre-authenticated profile, a gzipped tarball.
    #[serde(default = "default_archive")]
    pub archive: PathBuf,

    /// Authentication artifact file name inside the profile directory.
    #[serde(default = "default_storage_file")]
    pub storage_file: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            dir: None,
            archive: default_archive(),
            storage_file: default_storage_file(),
        }
    }
}

impl ProfileConfig {
    pub fn resolved_dir(&self, hosted: bool) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None if hosted => PathBuf::from(HOSTED_PROFILE_DIR),
            None => PathBuf::from(LOCAL_PROFILE_DIR),
        }
    }
}

fn default_archive() -> PathBuf {
    PathBuf::from("wati_profile.tar.gz")
}

fn default_storage_file() -> String {
    "storage.json".to_string()
}
