//! Login controller.
//!
//! Decides whether the resumed browser session is authenticated and, if
//! not, logs in with credentials, falling back to an operator-supervised
//! login when one is configured.
//!
//! ```text
//! CheckingSession ──► Authenticated
//!        │
//!        ▼
//!   NeedsLogin ──► AttemptingAutoLogin ──► Authenticated
//!                          │
//!                          ▼
//!                   AutoLoginFailed ──► AttemptingManualLogin ──► Authenticated
//!                          │                     │
//!                          └──────► Fatal ◄──────┘
//! ```

mod prompt;

use std::fmt;

use autobot_config::LoginConfig;
use tracing::{error, info, warn};

use crate::error::FlowError;
use crate::page::InboxPage;
use crate::session::SessionStore;

pub use prompt::{OperatorPrompt, StdinPrompt};

/// Login controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    CheckingSession,
    NeedsLogin,
    AttemptingAutoLogin,
    AutoLoginFailed,
    AttemptingManualLogin,
    Authenticated,
    Fatal,
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginState::CheckingSession => "checking_session",
            LoginState::NeedsLogin => "needs_login",
            LoginState::AttemptingAutoLogin => "attempting_auto_login",
            LoginState::AutoLoginFailed => "auto_login_failed",
            LoginState::AttemptingManualLogin => "attempting_manual_login",
            LoginState::Authenticated => "authenticated",
            LoginState::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// How the controller finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    AlreadyAuthenticated,
    AutomatedLoginSucceeded,
    ManualLoginSucceeded,
    LoginFailed { reason: String },
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, LoginOutcome::LoginFailed { .. })
    }
}

/// Runs the login state machine once against a page and a session store.
pub struct LoginController<'a> {
    page: &'a dyn InboxPage,
    store: &'a dyn SessionStore,
    prompt: Option<&'a dyn OperatorPrompt>,
    config: &'a LoginConfig,
    state: LoginState,
    history: Vec<LoginState>,
}

impl<'a> LoginController<'a> {
    pub fn new(
        page: &'a dyn InboxPage,
        store: &'a dyn SessionStore,
        config: &'a LoginConfig,
    ) -> Self {
        Self {
            page,
            store,
            prompt: None,
            config,
            state: LoginState::CheckingSession,
            history: Vec::new(),
        }
    }

    /// Enable the operator-supervised fallback.
    pub fn with_prompt(mut self, prompt: &'a dyn OperatorPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[LoginState] {
        &self.history
    }

    fn enter(&mut self, state: LoginState) {
        info!(state = %state, "Login state -> {}", state);
        self.state = state;
        self.history.push(state);
    }

    /// Drive the state machine to `Authenticated` or `Fatal`.
    pub async fn run(&mut self) -> LoginOutcome {
        self.enter(LoginState::CheckingSession);
        if self.check_session().await {
            info!("Logged in, session active");
            self.enter(LoginState::Authenticated);
            return LoginOutcome::AlreadyAuthenticated;
        }

        self.enter(LoginState::NeedsLogin);
        // A stale artifact must never be resumed again.
        if let Err(e) = self.store.invalidate().await {
            warn!("Failed to invalidate session artifact: {}", e);
        }

        self.enter(LoginState::AttemptingAutoLogin);
        let mut reason = match self.auto_login().await {
            Ok(()) => {
                info!("Automatic login successful");
                self.persist().await;
                self.enter(LoginState::Authenticated);
                return LoginOutcome::AutomatedLoginSucceeded;
            }
            Err(e) => {
                match &e {
                    FlowError::MissingCredentials(_) => {
                        error!("{}. Set WATI_EMAIL, WATI_PASSWORD and WATI_TENANT_ID", e)
                    }
                    _ => warn!("Automatic login failed: {}", e),
                }
                e.to_string()
            }
        };
        self.enter(LoginState::AutoLoginFailed);

        if let Some(prompt) = self.prompt {
            for attempt in 1..=self.config.manual_attempts {
                self.enter(LoginState::AttemptingManualLogin);
                info!(
                    "Falling back to manual login (attempt {}/{})",
                    attempt, self.config.manual_attempts
                );
                match self.manual_login(prompt).await {
                    Ok(()) => {
                        info!("Manual login detected");
                        self.persist().await;
                        self.enter(LoginState::Authenticated);
                        return LoginOutcome::ManualLoginSucceeded;
                    }
                    Err(e) => {
                        warn!("Login was not detected: {}", e);
                        reason = e.to_string();
                    }
                }
            }
        } else {
            info!("Interactive login unavailable, not falling back");
        }

        self.enter(LoginState::Fatal);
        LoginOutcome::LoginFailed { reason }
    }

    /// Load the inbox and look for the landmark.
    async fn check_session(&self) -> bool {
        info!("Navigating to WATI inbox...");
        if let Err(e) = self.page.open_inbox(self.config.navigation_timeout()).await {
            warn!("Inbox navigation failed: {}", e);
            return false;
        }
        tokio::time::sleep(self.config.initial_settle()).await;

        match self
            .page
            .wait_for_landmark(self.config.session_check_timeout())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                info!("Saved session not accepted: {}", e);
                false
            }
        }
    }

    async fn auto_login(&self) -> Result<(), FlowError> {
        let credentials = &self.config.credentials;
        let missing = credentials.missing_fields();
        if !missing.is_empty() {
            return Err(FlowError::MissingCredentials(missing));
        }
        let email = credentials.email.as_deref().unwrap_or_default();
        let password = credentials.password.as_deref().unwrap_or_default();
        let tenant_id = credentials.tenant_id.as_deref().unwrap_or_default();

        info!("Attempting automatic login...");
        let result = self.submit_login_form(email, password, tenant_id).await;
        if result.is_err() {
            match self.page.login_error_message().await {
                Ok(Some(message)) => warn!("Login page reports: {}", message),
                Ok(None) => {}
                Err(e) => warn!("Could not read login error: {}", e),
            }
        }
        result
    }

    async fn submit_login_form(
        &self,
        email: &str,
        password: &str,
        tenant_id: &str,
    ) -> Result<(), FlowError> {
        let form_timeout = self.config.form_timeout();

        self.page.open_login(self.config.navigation_timeout()).await?;
        self.page.wait_for_login_form(form_timeout).await?;
        self.page.fill_credentials(email, password, tenant_id).await?;
        if self.page.ensure_remember_me().await? {
            info!("Ticked remember me");
        }
        self.page.submit_login().await?;
        self.page.wait_for_inbox_url(form_timeout).await?;
        self.page.wait_for_landmark(form_timeout).await?;
        Ok(())
    }

    async fn manual_login(&self, prompt: &dyn OperatorPrompt) -> Result<(), FlowError> {
        self.page.open_login(self.config.navigation_timeout()).await?;
        prompt
            .wait_for_operator(
                "Complete the WATI login in the opened browser. \
                 Once 'Team Inbox' is visible, press ENTER to save the session.",
            )
            .await?;

        self.page.open_inbox(self.config.navigation_timeout()).await?;
        self.page
            .wait_for_landmark(self.config.form_timeout())
            .await?;
        Ok(())
    }

    /// Save the session. A failed save does not undo the login.
    async fn persist(&self) {
        let state = match self.page.storage_state().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to export session state: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.persist(&state).await {
            error!("Failed to save session: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
