//! [`InboxPage`] over a live CDP page session.

use std::time::Duration;

use async_trait::async_trait;
use autobot_browser::{CdpError, PageSession, StorageState};
use autobot_config::{InboxSelectors, LoginConfig};
use tracing::debug;

use super::{InboxPage, UnreadConversation};
use crate::error::PageError;

/// The WATI web application, driven through Chrome.
pub struct CdpInboxPage {
    session: PageSession,
    selectors: InboxSelectors,
    inbox_url: String,
    login_url: String,
}

impl CdpInboxPage {
    pub fn new(session: PageSession, selectors: InboxSelectors, login: &LoginConfig) -> Self {
        Self {
            session,
            selectors,
            inbox_url: login.inbox_url.clone(),
            login_url: login.login_url.clone(),
        }
    }
}

#[async_trait]
impl InboxPage for CdpInboxPage {
    async fn open_inbox(&self, timeout: Duration) -> Result<(), PageError> {
        self.session.navigate(&self.inbox_url, timeout).await?;
        Ok(())
    }

    async fn wait_for_landmark(&self, timeout: Duration) -> Result<(), PageError> {
        self.session
            .wait_for_text(&self.selectors.landmark_text, timeout)
            .await?;
        Ok(())
    }

    async fn open_login(&self, timeout: Duration) -> Result<(), PageError> {
        self.session.navigate(&self.login_url, timeout).await?;
        Ok(())
    }

    async fn wait_for_login_form(&self, timeout: Duration) -> Result<(), PageError> {
        self.session
            .wait_for_selector(&self.selectors.submit_button, timeout)
            .await?;
        Ok(())
    }

    async fn fill_credentials(
        &self,
        email: &str,
        password: &str,
        tenant_id: &str,
    ) -> Result<(), PageError> {
        self.session.fill(&self.selectors.email_input, email).await?;
        self.session
            .fill(&self.selectors.password_input, password)
            .await?;
        self.session
            .fill(&self.selectors.tenant_input, tenant_id)
            .await?;
        Ok(())
    }

    async fn ensure_remember_me(&self) -> Result<bool, PageError> {
        let expression = format!(
            r#"(() => {{
                const box = document.querySelector({});
                if (box && box.classList.contains('unchecked')) {{ box.click(); return true; }}
                return false;
            }})()"#,
            serde_json::to_string(&self.selectors.remember_me).map_err(CdpError::from)?
        );
        let clicked = self.session.evaluate(&expression).await?;
        Ok(clicked.as_bool().unwrap_or(false))
    }

    async fn submit_login(&self) -> Result<(), PageError> {
        self.session
            .click_selector(&self.selectors.submit_button)
            .await?;
        Ok(())
    }

    async fn wait_for_inbox_url(&self, timeout: Duration) -> Result<(), PageError> {
        self.session.wait_for_url(&self.inbox_url, timeout).await?;
        Ok(())
    }

    async fn login_error_message(&self) -> Result<Option<String>, PageError> {
        Ok(self
            .session
            .text_content(&self.selectors.login_error)
            .await?)
    }

    async fn wait_for_unread(&self, timeout: Duration) -> Result<bool, PageError> {
        match self
            .session
            .wait_for_selector(&self.selectors.unread_indicator, timeout)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match PageError::from(e) {
                PageError::Timeout(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn unread_conversations(&self) -> Result<Vec<UnreadConversation>, PageError> {
        let handles = self
            .session
            .query_selector_all(&self.selectors.unread_indicator)
            .await?;

        Ok(handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| UnreadConversation {
                position: index + 1,
                handle,
            })
            .collect())
    }

    async fn open_conversation(&self, conversation: &UnreadConversation) -> Result<(), PageError> {
        self.session.scroll_into_view(conversation.handle).await?;
        self.session.click_node(conversation.handle).await?;
        Ok(())
    }

    async fn open_action_menu(&self, timeout: Duration) -> Result<(), PageError> {
        self.session
            .wait_for_selector(&self.selectors.action_menu, timeout)
            .await?;
        self.session
            .click_selector(&self.selectors.action_menu)
            .await?;
        Ok(())
    }

    async fn click_routing_flow(&self) -> Result<bool, PageError> {
        if self
            .session
            .query_selector(&self.selectors.routing_flow)
            .await?
            .is_none()
        {
            return Ok(false);
        }
        self.session
            .click_selector(&self.selectors.routing_flow)
            .await?;
        Ok(true)
    }

    async fn reload(&self, timeout: Duration) -> Result<(), PageError> {
        self.session.reload(timeout).await?;
        Ok(())
    }

    async fn storage_state(&self) -> Result<StorageState, PageError> {
        Ok(self.session.export_storage_state().await?)
    }

    async fn apply_storage_state(&self, state: &StorageState) -> Result<(), PageError> {
        // Local storage lives in the profile directory; only cookies need seeding.
        self.session.set_cookies(&state.cookies).await?;
        debug!("Applied {} saved cookies", state.cookies.len());
        Ok(())
    }
}
