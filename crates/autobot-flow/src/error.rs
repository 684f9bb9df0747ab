//! Error types for the bot flow.

use autobot_browser::{BrowserError, CdpError};
use thiserror::Error;

/// Failure of a single page-adapter operation.
#[derive(Debug, Error)]
pub enum PageError {
    /// A bounded wait expired.
    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}

impl PageError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PageError::Timeout(_))
    }

    /// The browser connection is gone; no later page call can succeed.
    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            PageError::Browser(BrowserError::NotConnected | BrowserError::ConnectionFailed(_))
        )
    }
}

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        match BrowserError::from(e) {
            err if err.is_timeout() => PageError::Timeout(err.to_string()),
            BrowserError::ElementNotFound(selector) => PageError::ElementNotFound(selector),
            err => PageError::Browser(err),
        }
    }
}

/// Errors raised by the session store, the login controller and the bot flow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Missing credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Operator prompt failed: {0}")]
    Prompt(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
