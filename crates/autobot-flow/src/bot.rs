//! End-to-end bot flow: profile restore, browser provisioning, login and
//! the inbox poller.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use autobot_browser::{BrowserInstaller, BrowserManager, BrowserManagerConfig};
use autobot_config::BotConfig;
use tracing::{error, info, warn};

use crate::error::FlowError;
use crate::login::{LoginController, LoginOutcome, OperatorPrompt, StdinPrompt};
use crate::page::{CdpInboxPage, InboxPage};
use crate::poller::InboxPoller;
use crate::session::{ProfileStore, SessionStore};

/// The WATI automation, from an empty machine to a running poller.
pub struct BotFlow {
    config: BotConfig,
    store: ProfileStore,
}

impl BotFlow {
    pub fn new(config: BotConfig) -> Self {
        let store = ProfileStore::from_config(&config);
        Self { config, store }
    }

    /// Run the bot. Only returns on a startup or login failure, or when the
    /// browser connection is lost.
    pub async fn run(self) -> Result<(), FlowError> {
        info!("Launching WATI automation with persistent browser...");
        self.restore_profile().await;

        let manager = BrowserManager::new(self.manager_config(self.config.headless()).await?);
        let page = self.open_page(&manager).await?;

        let prompt = StdinPrompt;
        let interactive = self
            .config
            .interactive_fallback(std::io::stdin().is_terminal());
        let mut controller = LoginController::new(&page, &self.store, &self.config.login);
        if interactive {
            controller = controller.with_prompt(&prompt);
        }

        match controller.run().await {
            LoginOutcome::LoginFailed { reason } => {
                error!("Login failed, not starting the inbox poller: {}", reason);
                if let Err(e) = manager.shutdown().await {
                    warn!("Browser shutdown failed: {}", e);
                }
                Err(FlowError::LoginFailed(reason))
            }
            outcome => {
                info!(outcome = ?outcome, "Starting main WATI automation loop...");
                let poller = InboxPoller::new(
                    &page,
                    &self.config.poller,
                    self.config.login.navigation_timeout(),
                );
                let result = poller.run().await;
                if let Err(e) = &result {
                    error!("Inbox poller stopped: {}", e);
                }
                if let Err(e) = manager.shutdown().await {
                    warn!("Browser shutdown failed: {}", e);
                }
                result.map_err(FlowError::from)
            }
        }
    }

    /// Operator tool: log in by hand in a visible browser and save the session.
    pub async fn save_session(self) -> Result<(), FlowError> {
        let manager = BrowserManager::new(self.manager_config(false).await?);
        let page = self.open_page(&manager).await?;

        let result = self.supervised_login(&page, &StdinPrompt).await;
        if let Err(e) = manager.shutdown().await {
            warn!("Browser shutdown failed: {}", e);
        }
        result
    }

    async fn supervised_login(
        &self,
        page: &dyn InboxPage,
        prompt: &dyn OperatorPrompt,
    ) -> Result<(), FlowError> {
        let login = &self.config.login;
        page.open_login(login.navigation_timeout()).await?;
        prompt
            .wait_for_operator(
                "Log in to WATI in the opened browser window. \
                 Once your inbox is visible, come back here to save the session.",
            )
            .await?;

        page.open_inbox(login.navigation_timeout()).await?;
        page.wait_for_landmark(login.form_timeout()).await?;

        let state = page.storage_state().await?;
        self.store.persist(&state).await?;
        Ok(())
    }

    async fn restore_profile(&self) {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.restore_from_archive()).await {
            Ok(outcome) => info!(outcome = ?outcome, "Profile restore finished"),
            Err(e) => warn!("Profile restore task failed: {}", e),
        }
    }

    /// Locate (or install) Chromium and build its launch configuration.
    async fn manager_config(&self, headless: bool) -> Result<BrowserManagerConfig, FlowError> {
        let executable = match &self.config.browser.executable {
            Some(path) => path.clone(),
            None => {
                BrowserInstaller::new(
                    self.config.browser_cache_dir(),
                    self.config.browser.chromium_revision.clone(),
                    self.config.browser.installer.clone(),
                )
                .ensure_installed()
                .await?
            }
        };
        Ok(launch_config(&self.config, executable, headless))
    }

    /// Launch Chrome and seed it with the saved session, if any.
    async fn open_page(&self, manager: &BrowserManager) -> Result<CdpInboxPage, FlowError> {
        let session = manager.launch().await?;
        let page = CdpInboxPage::new(session, self.config.inbox.clone(), &self.config.login);

        if let Some(state) = self.store.load().await? {
            if let Err(e) = page.apply_storage_state(&state).await {
                warn!("Failed to apply saved session: {}", e);
            }
        }
        Ok(page)
    }
}

fn launch_config(config: &BotConfig, executable: PathBuf, headless: bool) -> BrowserManagerConfig {
    let browser = &config.browser;
    let mut launch = BrowserManagerConfig::new(executable, config.profile_dir());
    launch.debug_port = browser.debug_port;
    launch.viewport_width = browser.viewport_width;
    launch.viewport_height = browser.viewport_height;
    launch.headless = headless;
    launch.sandbox = config.sandbox_enabled();
    launch.startup_timeout = Duration::from_millis(browser.startup_timeout_ms);
    launch
}
