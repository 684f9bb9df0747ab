//! Inbox poller.
//!
//! Scans the inbox for unread conversations and tags each one with the
//! routing flow. Runs until the process exits or the browser connection is
//! lost.

use std::fmt;
use std::time::Duration;

use autobot_config::PollerConfig;
use tracing::{info, warn};

use crate::error::PageError;
use crate::page::{InboxPage, UnreadConversation};

/// What one poll cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Unread conversations in the batch.
    pub found: usize,
    /// Conversations whose click sequence completed.
    pub processed: usize,
    pub tagged: usize,
    /// Processed conversations without the routing flow item.
    pub missing_flow: usize,
    /// Position of the conversation that aborted the batch.
    pub aborted_at: Option<usize>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found={} processed={} tagged={} missing_flow={}",
            self.found, self.processed, self.tagged, self.missing_flow
        )?;
        if let Some(position) = self.aborted_at {
            write!(f, " aborted_at={}", position)?;
        }
        Ok(())
    }
}

pub struct InboxPoller<'a> {
    page: &'a dyn InboxPage,
    config: &'a PollerConfig,
    reload_timeout: Duration,
}

impl<'a> InboxPoller<'a> {
    pub fn new(page: &'a dyn InboxPage, config: &'a PollerConfig, reload_timeout: Duration) -> Self {
        Self {
            page,
            config,
            reload_timeout,
        }
    }

    /// Poll until the browser goes away.
    pub async fn run(&self) -> Result<(), PageError> {
        info!(
            "Starting inbox poller (interval {}s)",
            self.config.check_interval_secs
        );
        loop {
            self.cycle().await?;
        }
    }

    /// One full cycle: scan and process, then wait out the interval and reload.
    pub async fn cycle(&self) -> Result<CycleReport, PageError> {
        let report = self.poll_once().await?;
        info!(report = %report, "Poll cycle finished");

        info!(
            "Waiting {}s before next check...",
            self.config.check_interval_secs
        );
        tokio::time::sleep(self.config.check_interval()).await;
        self.reload().await?;

        Ok(report)
    }

    /// Scan for unread conversations and process the batch in document order.
    ///
    /// Page failures are logged and absorbed; only a lost browser
    /// connection is returned.
    pub async fn poll_once(&self) -> Result<CycleReport, PageError> {
        let mut report = CycleReport::default();

        info!("Checking for unread chats...");
        match self.page.wait_for_unread(self.config.unread_wait()).await {
            Ok(true) => {}
            Ok(false) => {
                info!("No unread chats found");
                return Ok(report);
            }
            Err(e) if e.is_disconnected() => return Err(e),
            Err(e) => {
                warn!("Unread scan failed: {}", e);
                return Ok(report);
            }
        }

        // The page may have changed while we waited; take a fresh snapshot.
        let conversations = match self.page.unread_conversations().await {
            Ok(conversations) => conversations,
            Err(e) if e.is_disconnected() => return Err(e),
            Err(e) => {
                warn!("Failed to list unread chats: {}", e);
                return Ok(report);
            }
        };
        report.found = conversations.len();
        if conversations.is_empty() {
            info!("No unread chats found");
            return Ok(report);
        }

        info!("Found {} unread chat(s), processing...", report.found);
        for conversation in &conversations {
            info!(
                "Opening unread chat {}/{}",
                conversation.position, report.found
            );
            match self.process(conversation).await {
                Ok(true) => {
                    report.processed += 1;
                    report.tagged += 1;
                }
                Ok(false) => {
                    report.processed += 1;
                    report.missing_flow += 1;
                }
                Err(e) if e.is_disconnected() => return Err(e),
                Err(e) => {
                    warn!(
                        "Error in chat #{}: {}; reloading and skipping the rest of the batch",
                        conversation.position, e
                    );
                    report.aborted_at = Some(conversation.position);
                    self.reload().await?;
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Open a conversation and apply the routing flow. Returns whether the
    /// flow item was found.
    async fn process(&self, conversation: &UnreadConversation) -> Result<bool, PageError> {
        self.page.open_conversation(conversation).await?;
        info!("Opened unread chat");
        tokio::time::sleep(self.config.open_settle()).await;

        self.page
            .open_action_menu(self.config.menu_timeout())
            .await?;
        tokio::time::sleep(self.config.menu_settle()).await;

        let tagged = self.page.click_routing_flow().await?;
        if tagged {
            info!("Routing flow applied");
        } else {
            warn!("Routing flow item not found");
        }
        tokio::time::sleep(self.config.after_flow()).await;

        Ok(tagged)
    }

    async fn reload(&self) -> Result<(), PageError> {
        match self.page.reload(self.reload_timeout).await {
            Err(e) if e.is_disconnected() => Err(e),
            Err(e) => {
                warn!("Page reload failed: {}", e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
