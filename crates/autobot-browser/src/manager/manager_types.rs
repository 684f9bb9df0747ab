//! Browser manager type definitions and configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cdp::CdpError;

/// Browser manager errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Chrome executable not found at {0}")]
    ChromeNotFound(String),

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Chromium installation failed: {0}")]
    InstallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    /// Whether this error is an expired wait.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            BrowserError::Timeout(_) | BrowserError::NavigationTimeout { .. }
        )
    }
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::ChromeNotAvailable(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::WebSocket(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::NavigationFailed(msg) => BrowserError::NavigationFailed(msg),
            CdpError::NavigationTimeout { url, timeout_ms } => {
                BrowserError::NavigationTimeout { url, timeout_ms }
            }
            CdpError::ElementNotFound(msg) => BrowserError::ElementNotFound(msg),
            CdpError::JavaScript(msg) => BrowserError::ActionFailed(format!("JS error: {}", msg)),
            CdpError::Timeout(msg) => BrowserError::Timeout(msg),
            CdpError::SessionClosed => BrowserError::NotConnected,
            _ => BrowserError::ActionFailed(e.to_string()),
        }
    }
}

/// Browser launch configuration.
#[derive(Debug, Clone)]
pub struct BrowserManagerConfig {
    /// Chrome executable.
    pub executable: PathBuf,
    /// Chrome debugging port.
    pub debug_port: u16,
    /// Window width.
    pub viewport_width: u32,
    /// Window height.
    pub viewport_height: u32,
    /// Profile directory backing the persistent context.
    pub profile_dir: PathBuf,
    /// Whether to run Chrome in headless mode.
    pub headless: bool,
    /// Keep Chrome's sandbox. Constrained hosts lack setuid helpers and /dev/shm.
    pub sandbox: bool,
    /// How long Chrome may take to expose its debugging endpoint.
    pub startup_timeout: Duration,
}

impl BrowserManagerConfig {
    pub fn new(executable: impl Into<PathBuf>, profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            debug_port: 9222,
            viewport_width: 1280,
            viewport_height: 800,
            profile_dir: profile_dir.into(),
            headless: true,
            sandbox: true,
            startup_timeout: Duration::from_secs(15),
        }
    }

    /// Get the CDP endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.debug_port)
    }

    /// Command-line arguments for the Chrome process.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            format!("--user-data-dir={}", self.profile_dir.display()),
            format!(
                "--window-size={},{}",
                self.viewport_width, self.viewport_height
            ),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
            "--disable-sync".to_string(),
            "--disable-translate".to_string(),
            "--metrics-recording-only".to_string(),
            "--password-store=basic".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
        }

        if !self.sandbox {
            args.push("--no-sandbox".to_string());
            args.push("--disable-setuid-sandbox".to_string());
            args.push("--disable-dev-shm-usage".to_string());
        }

        args
    }
}
