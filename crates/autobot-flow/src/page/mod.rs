//! Page adapter.
//!
//! Every interaction with the WATI web application goes through
//! [`InboxPage`]. The selectors it relies on live in one place
//! ([`autobot_config::InboxSelectors`]) and are only read by
//! [`CdpInboxPage`], so markup changes on the remote side touch a single
//! module. Controllers and tests see only the trait.

mod cdp_page;

use std::time::Duration;

use async_trait::async_trait;
use autobot_browser::StorageState;

use crate::error::PageError;

pub use cdp_page::CdpInboxPage;

/// One inbox item with unread messages, valid for a single poll cycle.
///
/// Conversations have no stable id in the markup; they are identified by
/// their 1-based position in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadConversation {
    pub position: usize,
    pub handle: i64,
}

/// Operations the login controller and the inbox poller need from the page.
#[async_trait]
pub trait InboxPage: Send + Sync {
    /// Load the team inbox.
    async fn open_inbox(&self, timeout: Duration) -> Result<(), PageError>;

    /// Wait for the landmark proving the inbox is loaded and authenticated.
    async fn wait_for_landmark(&self, timeout: Duration) -> Result<(), PageError>;

    /// Load the login page.
    async fn open_login(&self, timeout: Duration) -> Result<(), PageError>;

    /// Wait for the login form's submit control.
    async fn wait_for_login_form(&self, timeout: Duration) -> Result<(), PageError>;

    async fn fill_credentials(
        &self,
        email: &str,
        password: &str,
        tenant_id: &str,
    ) -> Result<(), PageError>;

    /// Tick "remember me" if present and unchecked. Returns whether it clicked.
    async fn ensure_remember_me(&self) -> Result<bool, PageError>;

    async fn submit_login(&self) -> Result<(), PageError>;

    /// Wait until the browser lands on the inbox URL.
    async fn wait_for_inbox_url(&self, timeout: Duration) -> Result<(), PageError>;

    /// Error text displayed by the login form, if any.
    async fn login_error_message(&self) -> Result<Option<String>, PageError>;

    /// Wait for at least one unread indicator. `Ok(false)` when none appeared.
    async fn wait_for_unread(&self, timeout: Duration) -> Result<bool, PageError>;

    /// Current unread conversations in document order.
    async fn unread_conversations(&self) -> Result<Vec<UnreadConversation>, PageError>;

    /// Scroll a conversation into view and click it.
    async fn open_conversation(&self, conversation: &UnreadConversation) -> Result<(), PageError>;

    /// Open the side action menu of the open conversation.
    async fn open_action_menu(&self, timeout: Duration) -> Result<(), PageError>;

    /// Click the routing flow item. `Ok(false)` when it is not in the menu.
    async fn click_routing_flow(&self) -> Result<bool, PageError>;

    async fn reload(&self, timeout: Duration) -> Result<(), PageError>;

    /// Authentication state of the browser context.
    async fn storage_state(&self) -> Result<StorageState, PageError>;

    /// Seed the browser context with a saved authentication state.
    async fn apply_storage_state(&self, state: &StorageState) -> Result<(), PageError>;
}
