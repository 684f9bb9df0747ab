//! BrowserManager core: launch, connect, page acquisition, shutdown.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{BrowserError, BrowserManagerConfig};
use crate::cdp::{CdpClient, PageSession};

/// Lock files Chrome leaves in a profile. A copied or crashed profile keeps
/// them, and Chrome then refuses to open the profile.
const PROFILE_LOCKS: [&str; 3] = ["SingletonLock", "SingletonSocket", "SingletonCookie"];

/// Bound on one `/json/version` probe while Chrome starts.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Owns the Chrome process and its CDP connection.
pub struct BrowserManager {
    config: BrowserManagerConfig,
    client: RwLock<Option<Arc<CdpClient>>>,
    /// Chrome process handle (if we launched it).
    chrome_process: RwLock<Option<Child>>,
}

impl BrowserManager {
    /// Create a new browser manager.
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            chrome_process: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &BrowserManagerConfig {
        &self.config
    }

    /// Start a persistent context rooted at the profile directory and return
    /// its page, reusing a restored tab when there is one.
    pub async fn launch(&self) -> Result<PageSession, BrowserError> {
        self.connect().await?;
        self.acquire_page().await
    }

    /// Check if Chrome answers on the debug port.
    pub(super) async fn is_chrome_running(&self) -> bool {
        reqwest::Client::new()
            .get(format!("{}/json/version", self.config.endpoint()))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }

    /// Whether anything accepts connections on the debug port.
    async fn is_port_taken(&self) -> bool {
        let addr = ("127.0.0.1", self.config.debug_port);
        matches!(
            tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(addr)).await,
            Ok(Ok(_))
        )
    }

    /// Spawn Chrome with remote debugging enabled.
    async fn launch_chrome(&self) -> Result<Child, BrowserError> {
        let executable = &self.config.executable;
        if !executable.exists() {
            return Err(BrowserError::ChromeNotFound(executable.display().to_string()));
        }

        let profile_dir = &self.config.profile_dir;
        std::fs::create_dir_all(profile_dir)?;
        clear_profile_locks(profile_dir);

        info!(
            "Launching Chrome (headless: {}, sandbox: {}) with profile at: {}",
            self.config.headless,
            self.config.sandbox,
            profile_dir.display()
        );

        let child = Command::new(executable)
            .args(self.config.chrome_args())
            .arg("about:blank")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Launch Chrome and connect to it. Refuses a debug port that is
    /// already taken.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_some() {
            return Ok(());
        }

        // A browser we did not start would carry some other profile and flags.
        if self.is_port_taken().await {
            return Err(BrowserError::LaunchFailed(format!(
                "debug port {} already in use",
                self.config.debug_port
            )));
        }

        let mut child = self.launch_chrome().await?;

        let deadline = Instant::now() + self.config.startup_timeout;
        loop {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if self.is_chrome_running().await {
                break;
            }
            if let Ok(Some(status)) = child.try_wait() {
                return Err(BrowserError::LaunchFailed(format!(
                    "Chrome exited during startup with {}",
                    status
                )));
            }
            if Instant::now() >= deadline {
                let _ = child.kill().await;
                return Err(BrowserError::LaunchFailed(
                    "Chrome failed to start within timeout".to_string(),
                ));
            }
        }

        *self.chrome_process.write().await = Some(child);

        let client = CdpClient::connect(&self.config.endpoint()).await?;
        debug!("Browser socket: {}", client.browser_ws_url());
        *self.client.write().await = Some(Arc::new(client));

        info!("Connected to Chrome at {}", self.config.endpoint());
        Ok(())
    }

    /// Get the CDP client.
    async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// Attach to the first open tab, or open a new one.
    async fn acquire_page(&self) -> Result<PageSession, BrowserError> {
        let client = self.client().await?;

        let existing = client
            .list_pages()
            .await?
            .into_iter()
            .find(|page| page.is_page());

        let session = match existing {
            Some(page) => {
                debug!("Reusing open page {} ({})", page.id, page.url);
                client.attach_page(&page.id).await?
            }
            None => {
                debug!("No open page, creating one");
                client.new_page(None).await?
            }
        };

        Ok(session)
    }

    /// Close the CDP connection and stop Chrome if we launched it.
    pub async fn shutdown(&self) -> Result<(), BrowserError> {
        if let Some(client) = self.client.write().await.take() {
            if let Err(e) = client.close_browser().await {
                debug!("Browser.close failed: {}", e);
            }
        }

        if let Some(mut child) = self.chrome_process.write().await.take() {
            info!("Shutting down Chrome...");
            let _ = child.kill().await;
        }

        info!("Browser connection closed");
        Ok(())
    }
}

fn clear_profile_locks(profile_dir: &Path) {
    for name in PROFILE_LOCKS {
        let path = profile_dir.join(name);
        // Singleton files are usually dangling symlinks, so `exists()` would lie.
        if std::fs::symlink_metadata(&path).is_ok() {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed stale {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
pub(super) fn clear_profile_locks_for_test(profile_dir: &Path) {
    clear_profile_locks(profile_dir)
}
