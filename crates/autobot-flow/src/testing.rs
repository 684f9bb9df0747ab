//! Test doubles: a scripted inbox page, a recording session store and an
//! operator prompt, all writing into one shared event log.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autobot_browser::{BrowserError, Cookie, StorageState};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::{FlowError, PageError};
use crate::login::OperatorPrompt;
use crate::page::{InboxPage, UnreadConversation};
use crate::session::SessionStore;

/// Ordered record of calls made against the doubles.
#[derive(Clone, Default)]
pub(crate) struct EventLog {
    events: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl EventLog {
    pub(crate) fn record(&self, event: impl Into<String>) {
        self.events.lock().push((event.into(), Instant::now()));
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().iter().map(|(e, _)| e.clone()).collect()
    }

    pub(crate) fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|(e, _)| e == event).count()
    }

    pub(crate) fn position(&self, event: &str) -> Option<usize> {
        self.events.lock().iter().position(|(e, _)| e == event)
    }

    pub(crate) fn last_position(&self, event: &str) -> Option<usize> {
        self.events.lock().iter().rposition(|(e, _)| e == event)
    }

    /// Times at which `event` was recorded.
    pub(crate) fn times(&self, event: &str) -> Vec<Instant> {
        self.events
            .lock()
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, t)| *t)
            .collect()
    }

    pub(crate) fn any(&self, predicate: impl Fn(&str) -> bool) -> bool {
        self.events.lock().iter().any(|(e, _)| predicate(e))
    }
}

#[derive(Default)]
struct PageScript {
    authenticated: bool,
    login_succeeds: bool,
    login_error: Option<String>,
    /// Unread count per cycle; an exhausted queue means an empty inbox.
    unread_batches: VecDeque<usize>,
    failing_positions: HashSet<usize>,
    missing_flow_positions: HashSet<usize>,
    /// Chrome is gone: every inbox call fails with `NotConnected`.
    disconnected: bool,
    disconnect_at: Option<usize>,
    reload_times_out: bool,
}

/// Scripted stand-in for the WATI web application.
pub(crate) struct FakePage {
    log: EventLog,
    script: Mutex<PageScript>,
}

impl FakePage {
    pub(crate) fn new(log: EventLog) -> Self {
        Self {
            log,
            script: Mutex::new(PageScript::default()),
        }
    }

    /// The resumed session is still valid.
    pub(crate) fn authenticated(self) -> Self {
        self.script.lock().authenticated = true;
        self
    }

    /// Submitting the login form succeeds.
    pub(crate) fn login_succeeds(self) -> Self {
        self.script.lock().login_succeeds = true;
        self
    }

    pub(crate) fn with_login_error(self, message: &str) -> Self {
        self.script.lock().login_error = Some(message.to_string());
        self
    }

    pub(crate) fn with_unread_batches(self, batches: &[usize]) -> Self {
        self.script.lock().unread_batches = batches.iter().copied().collect();
        self
    }

    /// Opening the conversation at `position` throws.
    pub(crate) fn failing_at(self, position: usize) -> Self {
        self.script.lock().failing_positions.insert(position);
        self
    }

    pub(crate) fn missing_flow_at(self, position: usize) -> Self {
        self.script.lock().missing_flow_positions.insert(position);
        self
    }

    pub(crate) fn disconnected(self) -> Self {
        self.script.lock().disconnected = true;
        self
    }

    /// The browser dies while opening the conversation at `position`.
    pub(crate) fn disconnecting_at(self, position: usize) -> Self {
        self.script.lock().disconnect_at = Some(position);
        self
    }

    pub(crate) fn reload_times_out(self) -> Self {
        self.script.lock().reload_times_out = true;
        self
    }

    fn check_connected(&self) -> Result<(), PageError> {
        if self.script.lock().disconnected {
            Err(PageError::Browser(BrowserError::NotConnected))
        } else {
            Ok(())
        }
    }

    /// What a human logging in through the browser window does.
    pub(crate) fn operator_logs_in(&self) {
        self.script.lock().authenticated = true;
    }

    fn is_authenticated(&self) -> bool {
        self.script.lock().authenticated
    }

    async fn expire(&self, what: &str, timeout: Duration) -> PageError {
        tokio::time::sleep(timeout).await;
        PageError::Timeout(format!("Waiting for {} timed out", what))
    }
}

#[async_trait]
impl InboxPage for FakePage {
    async fn open_inbox(&self, _timeout: Duration) -> Result<(), PageError> {
        self.log.record("open_inbox");
        Ok(())
    }

    async fn wait_for_landmark(&self, timeout: Duration) -> Result<(), PageError> {
        self.log.record("wait_for_landmark");
        if self.is_authenticated() {
            self.log.record("landmark_ok");
            Ok(())
        } else {
            Err(self.expire("landmark", timeout).await)
        }
    }

    async fn open_login(&self, _timeout: Duration) -> Result<(), PageError> {
        self.log.record("open_login");
        Ok(())
    }

    async fn wait_for_login_form(&self, _timeout: Duration) -> Result<(), PageError> {
        self.log.record("wait_for_login_form");
        Ok(())
    }

    async fn fill_credentials(
        &self,
        email: &str,
        _password: &str,
        tenant_id: &str,
    ) -> Result<(), PageError> {
        self.log
            .record(format!("fill_credentials:{}:{}", email, tenant_id));
        Ok(())
    }

    async fn ensure_remember_me(&self) -> Result<bool, PageError> {
        self.log.record("ensure_remember_me");
        Ok(true)
    }

    async fn submit_login(&self) -> Result<(), PageError> {
        self.log.record("submit_login");
        let mut script = self.script.lock();
        if script.login_succeeds {
            script.authenticated = true;
        }
        Ok(())
    }

    async fn wait_for_inbox_url(&self, timeout: Duration) -> Result<(), PageError> {
        self.log.record("wait_for_inbox_url");
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(self.expire("inbox URL", timeout).await)
        }
    }

    async fn login_error_message(&self) -> Result<Option<String>, PageError> {
        self.log.record("login_error_message");
        Ok(self.script.lock().login_error.clone())
    }

    async fn wait_for_unread(&self, timeout: Duration) -> Result<bool, PageError> {
        self.log.record("wait_for_unread");
        self.check_connected()?;
        let pending = self.script.lock().unread_batches.front().copied().unwrap_or(0);
        if pending > 0 {
            Ok(true)
        } else {
            self.script.lock().unread_batches.pop_front();
            tokio::time::sleep(timeout).await;
            Ok(false)
        }
    }

    async fn unread_conversations(&self) -> Result<Vec<UnreadConversation>, PageError> {
        self.log.record("unread_conversations");
        self.check_connected()?;
        let count = self.script.lock().unread_batches.pop_front().unwrap_or(0);
        Ok((1..=count)
            .map(|position| UnreadConversation {
                position,
                handle: 100 + position as i64,
            })
            .collect())
    }

    async fn open_conversation(&self, conversation: &UnreadConversation) -> Result<(), PageError> {
        self.log
            .record(format!("open_conversation:{}", conversation.position));
        if self.script.lock().disconnect_at == Some(conversation.position) {
            self.script.lock().disconnected = true;
        }
        self.check_connected()?;
        if self
            .script
            .lock()
            .failing_positions
            .contains(&conversation.position)
        {
            return Err(PageError::ElementNotFound(format!(
                "node {} (not visible)",
                conversation.handle
            )));
        }
        Ok(())
    }

    async fn open_action_menu(&self, _timeout: Duration) -> Result<(), PageError> {
        self.log.record("open_action_menu");
        Ok(())
    }

    async fn click_routing_flow(&self) -> Result<bool, PageError> {
        // The most recently opened conversation decides the answer.
        let last_open = self
            .log
            .events()
            .iter()
            .rev()
            .find_map(|e| e.strip_prefix("open_conversation:")?.parse::<usize>().ok());
        let present = last_open
            .map(|p| !self.script.lock().missing_flow_positions.contains(&p))
            .unwrap_or(true);
        self.log.record(if present {
            "click_routing_flow"
        } else {
            "routing_flow_missing"
        });
        Ok(present)
    }

    async fn reload(&self, timeout: Duration) -> Result<(), PageError> {
        self.log.record("reload");
        self.check_connected()?;
        if self.script.lock().reload_times_out {
            return Err(self.expire("fresh document", timeout).await);
        }
        Ok(())
    }

    async fn storage_state(&self) -> Result<StorageState, PageError> {
        self.log.record("storage_state");
        Ok(StorageState {
            cookies: vec![Cookie {
                name: "_wati_session".to_string(),
                value: "token".to_string(),
                domain: "live.wati.io".to_string(),
                path: "/".to_string(),
                expires: -1.0,
                http_only: true,
                secure: true,
                same_site: None,
            }],
            origins: vec![],
        })
    }

    async fn apply_storage_state(&self, state: &StorageState) -> Result<(), PageError> {
        self.log
            .record(format!("apply_storage_state:{}", state.cookies.len()));
        Ok(())
    }
}

/// Session store that only records what it was asked to do.
pub(crate) struct RecordingStore {
    log: EventLog,
    saved: Mutex<Option<StorageState>>,
}

impl RecordingStore {
    pub(crate) fn new(log: EventLog) -> Self {
        Self {
            log,
            saved: Mutex::new(None),
        }
    }

    pub(crate) fn with_saved(self, state: StorageState) -> Self {
        *self.saved.lock() = Some(state);
        self
    }

    pub(crate) fn saved(&self) -> Option<StorageState> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn invalidate(&self) -> Result<(), FlowError> {
        self.log.record("invalidate");
        *self.saved.lock() = None;
        Ok(())
    }

    async fn persist(&self, state: &StorageState) -> Result<(), FlowError> {
        self.log.record("persist");
        *self.saved.lock() = Some(state.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<StorageState>, FlowError> {
        self.log.record("load");
        Ok(self.saved.lock().clone())
    }
}

/// Operator who either logs in through the browser or walks away.
pub(crate) struct FakePrompt<'p> {
    log: EventLog,
    page: Option<&'p FakePage>,
}

impl<'p> FakePrompt<'p> {
    /// The operator completes the login before pressing Enter.
    pub(crate) fn logging_in(log: EventLog, page: &'p FakePage) -> Self {
        Self {
            log,
            page: Some(page),
        }
    }

    /// The operator presses Enter without logging in.
    pub(crate) fn idle(log: EventLog) -> Self {
        Self { log, page: None }
    }
}

#[async_trait]
impl OperatorPrompt for FakePrompt<'_> {
    async fn wait_for_operator(&self, _message: &str) -> Result<(), FlowError> {
        self.log.record("operator_prompt");
        if let Some(page) = self.page {
            page.operator_logs_in();
        }
        Ok(())
    }
}
