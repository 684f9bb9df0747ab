//! Browser binary provisioning.
//!
//! Chromium lives under a cache directory at a path determined by its build
//! revision. When it is missing, an external installer is run with the cache
//! directory exported as `PLAYWRIGHT_BROWSERS_PATH`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::info;

use crate::manager::BrowserError;

#[cfg(target_os = "macos")]
const EXECUTABLE_SUBPATH: &str = "chrome-mac/Chromium.app/Contents/MacOS/Chromium";
#[cfg(target_os = "windows")]
const EXECUTABLE_SUBPATH: &str = "chrome-win/chrome.exe";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const EXECUTABLE_SUBPATH: &str = "chrome-linux/chrome";

/// Locates or installs the Chromium build the bot drives.
#[derive(Debug, Clone)]
pub struct BrowserInstaller {
    cache_dir: PathBuf,
    revision: String,
    command: Vec<String>,
}

impl BrowserInstaller {
    pub fn new(cache_dir: impl Into<PathBuf>, revision: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            revision: revision.into(),
            command,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Deterministic executable location inside the cache directory.
    pub fn expected_executable(&self) -> PathBuf {
        self.cache_dir
            .join(format!("chromium-{}", self.revision))
            .join(EXECUTABLE_SUBPATH)
    }

    /// Return the executable path, running the installer first if needed.
    ///
    /// A failing installer is fatal: the bot cannot run without a browser.
    pub async fn ensure_installed(&self) -> Result<PathBuf, BrowserError> {
        let executable = self.expected_executable();
        if executable.exists() {
            info!("Chromium already installed at {}", executable.display());
            return Ok(executable);
        }

        std::fs::create_dir_all(&self.cache_dir)?;

        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| BrowserError::InstallFailed("no installer command configured".to_string()))?;

        info!("Installing Chromium into {}...", self.cache_dir.display());

        let mut child = Command::new(program)
            .args(args)
            .env("PLAYWRIGHT_BROWSERS_PATH", &self.cache_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BrowserError::InstallFailed(format!("failed to spawn {}: {}", program, e)))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        tokio::join!(stream_lines(stdout), stream_lines(stderr));

        let status = child.wait().await?;
        if !status.success() {
            return Err(BrowserError::InstallFailed(format!(
                "installer exited with {}",
                status
            )));
        }

        if !executable.exists() {
            return Err(BrowserError::InstallFailed(format!(
                "installer succeeded but {} is missing",
                executable.display()
            )));
        }

        info!("Chromium installed successfully");
        Ok(executable)
    }
}

/// Forward a child's output into the log, line by line.
async fn stream_lines<R: AsyncRead + Unpin>(reader: Option<R>) {
    let Some(reader) = reader else {
        return;
    };
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if !line.is_empty() {
            info!(target: "installer", "{}", line);
        }
    }
}
