use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::transport::Transport;

/// A flattened CDP session attached to one tab.
pub struct PageSession {
    pub(super) target_id: String,
    pub(super) session_id: String,
    transport: Arc<Transport>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Arc<Transport>) -> Self {
        Self {
            target_id,
            session_id,
            transport,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a command scoped to this tab.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .send(method, params, Some(&self.session_id))
            .await
    }

    /// Turn on the domains the bot drives: navigation, DOM lookups,
    /// script evaluation and cookies.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        for domain in ["Page", "DOM", "Runtime", "Network"] {
            self.call(&format!("{}.enable", domain), None).await?;
        }
        debug!(tab = %self.target_id, "CDP domains enabled");
        Ok(())
    }
}
