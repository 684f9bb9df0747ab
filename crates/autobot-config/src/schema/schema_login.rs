//! Login, inbox selector and poller configuration types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Login flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    #[serde(default = "default_inbox_url")]
    pub inbox_url: String,

    #[serde(default = "default_login_url")]
    pub login_url: String,

    #[serde(default)]
    pub credentials: Credentials,

    /// Operator-supervised fallback. `None` means: only on a local terminal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive_fallback: Option<bool>,

    /// Manual login attempts before giving up.
    #[serde(default = "default_manual_attempts")]
    pub manual_attempts: u32,

    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Landmark wait when resuming a saved session.
    #[serde(default = "default_session_check_timeout")]
    pub session_check_timeout_secs: u64,

    /// Wait for the login form and for the inbox after submitting.
    #[serde(default = "default_form_timeout")]
    pub form_timeout_secs: u64,

    /// Grace period after the first inbox navigation.
    #[serde(default = "default_initial_settle")]
    pub initial_settle_ms: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            inbox_url: default_inbox_url(),
            login_url: default_login_url(),
            credentials: Credentials::default(),
            interactive_fallback: None,
            manual_attempts: default_manual_attempts(),
            navigation_timeout_secs: default_navigation_timeout(),
            session_check_timeout_secs: default_session_check_timeout(),
            form_timeout_secs: default_form_timeout(),
            initial_settle_ms: default_initial_settle(),
        }
    }
}

impl LoginConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn session_check_timeout(&self) -> Duration {
        Duration::from_secs(self.session_check_timeout_secs)
    }

    pub fn form_timeout(&self) -> Duration {
        Duration::from_secs(self.form_timeout_secs)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }
}

fn default_inbox_url() -> String {
    "https://live.wati.io/1037246/teamInbox/".to_string()
}

fn default_login_url() -> String {
    "https://auth.wati.io/login".to_string()
}

fn default_manual_attempts() -> u32 {
    1
}

fn default_navigation_timeout() -> u64 {
    60
}

fn default_session_check_timeout() -> u64 {
    60
}

fn default_form_timeout() -> u64 {
    30
}

fn default_initial_settle() -> u64 {
    3000
}

/// Login credentials. Never persisted; `Debug` redacts the secret.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            tenant_id: Some(tenant_id.into()),
        }
    }

    /// Names of the fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();
        let mut missing = Vec::new();
        if blank(&self.email) {
            missing.push("email");
        }
        if blank(&self.password) {
            missing.push("password");
        }
        if blank(&self.tenant_id) {
            missing.push("tenant_id");
        }
        missing
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Selectors for the WATI web application. Only the page adapter reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxSelectors {
    /// Text whose presence proves the inbox has loaded.
    #[serde(default = "default_landmark_text")]
    pub landmark_text: String,

    #[serde(default = "default_email_input")]
    pub email_input: String,

    #[serde(default = "default_password_input")]
    pub password_input: String,

    #[serde(default = "default_tenant_input")]
    pub tenant_input: String,

    #[serde(default = "default_remember_me")]
    pub remember_me: String,

    #[serde(default = "default_submit_button")]
    pub submit_button: String,

    #[serde(default = "default_login_error")]
    pub login_error: String,

    #[serde(default = "default_unread_indicator")]
    pub unread_indicator: String,

    #[serde(default = "default_action_menu")]
    pub action_menu: String,

    #[serde(default = "default_routing_flow")]
    pub routing_flow: String,
}

impl Default for InboxSelectors {
    fn default() -> Self {
        Self {
            landmark_text: default_landmark_text(),
            email_input: default_email_input(),
            password_input: default_password_input(),
            tenant_input: default_tenant_input(),
            remember_me: default_remember_me(),
            submit_button: default_submit_button(),
            login_error: default_login_error(),
            unread_indicator: default_unread_indicator(),
            action_menu: default_action_menu(),
            routing_flow: default_routing_flow(),
        }
    }
}

fn default_landmark_text() -> String {
    "Team Inbox".to_string()
}

fn default_email_input() -> String {
    r#"input[name="email"]"#.to_string()
}

fn default_password_input() -> String {
    r#"input[name="password"]"#.to_string()
}

fn default_tenant_input() -> String {
    r#"input[name="tenantId"]"#.to_string()
}

fn default_remember_me() -> String {
    r#".right-box__check-box [role="checkbox"]"#.to_string()
}

fn default_submit_button() -> String {
    r#"form button[type="submit"]"#.to_string()
}

fn default_login_error() -> String {
    r#"[role="alert"], .error-message, .ant-form-item-explain-error"#.to_string()
}

fn default_unread_indicator() -> String {
    "div.conversation-item__unread-count".to_string()
}

fn default_action_menu() -> String {
    "#mainTeamInbox div.chat-side-content div span.chat-input__icon-option".to_string()
}

fn default_routing_flow() -> String {
    "#flow-nav-68ff67df4f393f0757f108d8".to_string()
}

/// Inbox poller timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Sleep between scans.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Wait for the first unread indicator each cycle.
    #[serde(default = "default_unread_wait")]
    pub unread_wait_ms: u64,

    /// Settle delay after opening a conversation.
    #[serde(default = "default_open_settle")]
    pub open_settle_ms: u64,

    #[serde(default = "default_menu_timeout")]
    pub menu_timeout_ms: u64,

    /// Settle delay after opening the action menu.
    #[serde(default = "default_menu_settle")]
    pub menu_settle_ms: u64,

    /// Delay after tagging, before the next conversation.
    #[serde(default = "default_after_flow")]
    pub after_flow_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            unread_wait_ms: default_unread_wait(),
            open_settle_ms: default_open_settle(),
            menu_timeout_ms: default_menu_timeout(),
            menu_settle_ms: default_menu_settle(),
            after_flow_ms: default_after_flow(),
        }
    }
}

impl PollerConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn unread_wait(&self) -> Duration {
        Duration::from_millis(self.unread_wait_ms)
    }

    pub fn open_settle(&self) -> Duration {
        Duration::from_millis(self.open_settle_ms)
    }

    pub fn menu_timeout(&self) -> Duration {
        Duration::from_millis(self.menu_timeout_ms)
    }

    pub fn menu_settle(&self) -> Duration {
        Duration::from_millis(self.menu_settle_ms)
    }

    pub fn after_flow(&self) -> Duration {
        Duration::from_millis(self.after_flow_ms)
    }
}

fn default_check_interval() -> u64 {
    180
}

fn default_unread_wait() -> u64 {
    10_000
}

fn default_open_settle() -> u64 {
    2500
}

fn default_menu_timeout() -> u64 {
    10_000
}

fn default_menu_settle() -> u64 {
    1500
}

fn default_after_flow() -> u64 {
    2000
}
