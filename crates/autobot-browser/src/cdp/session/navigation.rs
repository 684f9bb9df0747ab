//! Navigation and waiting operations for CDP page session.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;

use super::core::PageSession;

/// Delay between polls while waiting on the page.
pub(super) const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Flag planted on the outgoing document. A fresh document never carries it,
/// so its absence proves the navigation replaced the page.
const STALE_MARKER: &str = "window.__autobotStale";

impl PageSession {
    /// Navigate to URL and wait until the new document is ready.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), CdpError> {
        self.mark_document_stale().await;

        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
            if !error.is_empty() {
                return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
            }
        }

        self.wait_for_fresh_document(timeout)
            .await
            .map_err(|e| match e {
                CdpError::Timeout(_) => CdpError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                },
                other => other,
            })?;

        debug!("Navigated to {}", url);
        Ok(())
    }

    /// Reload page and wait for the new document.
    pub async fn reload(&self, timeout: Duration) -> Result<(), CdpError> {
        self.mark_document_stale().await;
        self.call("Page.reload", None).await?;
        self.wait_for_fresh_document(timeout).await
    }

    async fn mark_document_stale(&self) {
        // No document yet (about:blank mid-load) is fine: nothing to mark.
        let _ = self.evaluate(&format!("{} = true", STALE_MARKER)).await;
    }

    /// Wait until the marker is gone and the document is interactive.
    async fn wait_for_fresh_document(&self, timeout: Duration) -> Result<(), CdpError> {
        let expression = format!(
            "!{} && (document.readyState === 'complete' || document.readyState === 'interactive')",
            STALE_MARKER
        );
        let start = Instant::now();

        loop {
            // Evaluation races with the navigation itself; treat errors as "not yet".
            if let Ok(value) = self.evaluate(&expression).await {
                if value.as_bool() == Some(true) {
                    return Ok(());
                }
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Get current URL.
    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    /// Wait until the current URL starts with `prefix`.
    pub async fn wait_for_url(&self, prefix: &str, timeout: Duration) -> Result<(), CdpError> {
        let start = Instant::now();

        loop {
            if let Ok(url) = self.get_url().await {
                if url.starts_with(prefix) {
                    return Ok(());
                }
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout(format!(
                    "Waiting for URL '{}' timed out",
                    prefix
                )));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait for selector to appear. Returns the transient node id.
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<i64, CdpError> {
        let start = Instant::now();

        loop {
            if let Some(node_id) = self.query_selector(selector).await? {
                return Ok(node_id);
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout(format!(
                    "Waiting for selector '{}' timed out",
                    selector
                )));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until the visible page text contains `text`.
    pub async fn wait_for_text(&self, text: &str, timeout: Duration) -> Result<(), CdpError> {
        let expression = format!(
            "!!document.body && document.body.innerText.includes({})",
            serde_json::to_string(text)?
        );
        let start = Instant::now();

        loop {
            if let Ok(value) = self.evaluate(&expression).await {
                if value.as_bool() == Some(true) {
                    return Ok(());
                }
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout(format!(
                    "Waiting for text '{}' timed out",
                    text
                )));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
